use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use teesheet_core::models::PlayerIdentity;
use teesheet_core::repository::FlightRepository;
use teesheet_core::{
    BoxError, DuplicateKey, Flight, FlightStatus, Player, PlayerType, StaleWrite, StartingHole,
    TeeTime,
};
use teesheet_shared::Masked;
use tracing::debug;
use uuid::Uuid;

use crate::codec::{enum_from_text, enum_to_text, narrow};

const FLIGHT_COLUMNS: &str = "id, tenant_id, course_id, booking_number, tee_date, tee_time, starting_hole, \
     holes, status, notes, cancelled_at, cancelled_by, cancellation_reason, created_by, created_at, updated_at";

const PLAYER_COLUMNS: &str = "id, flight_id, position, player_type, member_id, dependent_id, guest_name, \
     guest_email, sponsor_member_id, cart_request, caddy_request, rental_request, checked_in, checked_in_at";

pub struct PgFlightRepository {
    pool: PgPool,
}

impl PgFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_players(&self, flight_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Player>>, BoxError> {
        let rows: Vec<PlayerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flight_players WHERE flight_id = ANY($1) ORDER BY flight_id, position",
            PLAYER_COLUMNS
        ))
        .bind(flight_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut players: HashMap<Uuid, Vec<Player>> = HashMap::new();
        for row in rows {
            let flight_id = row.flight_id;
            players.entry(flight_id).or_default().push(row.try_into()?);
        }
        Ok(players)
    }

    async fn assemble(&self, rows: Vec<FlightRow>) -> Result<Vec<Flight>, BoxError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut players = self.load_players(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let own = players.remove(&row.id).unwrap_or_default();
                row.into_flight(own)
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    tenant_id: Uuid,
    course_id: Uuid,
    booking_number: String,
    tee_date: NaiveDate,
    tee_time: NaiveTime,
    starting_hole: i16,
    holes: i16,
    status: String,
    notes: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    cancelled_by: Option<String>,
    cancellation_reason: Option<String>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FlightRow {
    fn into_flight(self, players: Vec<Player>) -> Result<Flight, BoxError> {
        let hole: u8 = narrow("starting_hole", self.starting_hole)?;
        Ok(Flight {
            id: self.id,
            tenant_id: self.tenant_id,
            course_id: self.course_id,
            booking_number: self.booking_number,
            tee_date: self.tee_date,
            tee_time: TeeTime::from_naive_time(self.tee_time),
            starting_hole: StartingHole::try_from(hole)?,
            holes: narrow("holes", self.holes)?,
            status: self.status.parse::<FlightStatus>()?,
            players,
            notes: self.notes,
            cancelled_at: self.cancelled_at,
            cancelled_by: self.cancelled_by,
            cancellation_reason: self.cancellation_reason,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PlayerRow {
    id: Uuid,
    flight_id: Uuid,
    position: i16,
    player_type: String,
    member_id: Option<Uuid>,
    dependent_id: Option<Uuid>,
    guest_name: Option<String>,
    guest_email: Option<String>,
    sponsor_member_id: Option<Uuid>,
    cart_request: String,
    caddy_request: String,
    rental_request: String,
    checked_in: bool,
    checked_in_at: Option<DateTime<Utc>>,
}

fn required<T>(value: Option<T>, column: &str, player_id: Uuid) -> Result<T, BoxError> {
    value.ok_or_else(|| format!("player {} is missing {}", player_id, column).into())
}

impl TryFrom<PlayerRow> for Player {
    type Error = BoxError;

    fn try_from(row: PlayerRow) -> Result<Self, Self::Error> {
        let identity = match enum_from_text::<PlayerType>(&row.player_type)? {
            PlayerType::Member => PlayerIdentity::Member {
                member_id: required(row.member_id, "member_id", row.id)?,
            },
            PlayerType::Dependent => PlayerIdentity::Dependent {
                dependent_id: required(row.dependent_id, "dependent_id", row.id)?,
            },
            PlayerType::Guest => PlayerIdentity::Guest {
                guest_name: Masked(required(row.guest_name, "guest_name", row.id)?),
                guest_email: row.guest_email.map(Masked),
                sponsor_member_id: row.sponsor_member_id,
            },
            PlayerType::WalkUp => PlayerIdentity::WalkUp {
                guest_name: Masked(required(row.guest_name, "guest_name", row.id)?),
            },
        };

        Ok(Player {
            id: row.id,
            position: narrow("position", row.position)?,
            identity,
            cart_request: enum_from_text(&row.cart_request)?,
            caddy_request: enum_from_text(&row.caddy_request)?,
            rental_request: enum_from_text(&row.rental_request)?,
            checked_in: row.checked_in,
            checked_in_at: row.checked_in_at,
        })
    }
}

async fn insert_players(conn: &mut PgConnection, flight: &Flight) -> Result<(), BoxError> {
    let sql = format!(
        "INSERT INTO flight_players ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        PLAYER_COLUMNS
    );

    for player in &flight.players {
        let (member_id, dependent_id, guest_name, guest_email, sponsor) = match &player.identity {
            PlayerIdentity::Member { member_id } => (Some(*member_id), None, None, None, None),
            PlayerIdentity::Dependent { dependent_id } => (None, Some(*dependent_id), None, None, None),
            PlayerIdentity::Guest { guest_name, guest_email, sponsor_member_id } => (
                None,
                None,
                Some(guest_name.expose().as_str()),
                guest_email.as_ref().map(|e| e.expose().as_str()),
                *sponsor_member_id,
            ),
            PlayerIdentity::WalkUp { guest_name } => (None, None, Some(guest_name.expose().as_str()), None, None),
        };

        sqlx::query(&sql)
            .bind(player.id)
            .bind(flight.id)
            .bind(i16::from(player.position))
            .bind(enum_to_text(&player.player_type())?)
            .bind(member_id)
            .bind(dependent_id)
            .bind(guest_name)
            .bind(guest_email)
            .bind(sponsor)
            .bind(enum_to_text(&player.cart_request)?)
            .bind(enum_to_text(&player.caddy_request)?)
            .bind(enum_to_text(&player.rental_request)?)
            .bind(player.checked_in)
            .bind(player.checked_in_at)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl FlightRepository for PgFlightRepository {
    async fn get_flight(&self, tenant_id: Uuid, flight_id: Uuid) -> Result<Option<Flight>, BoxError> {
        let row: Option<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights WHERE id = $1 AND tenant_id = $2",
            FLIGHT_COLUMNS
        ))
        .bind(flight_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_active_flights(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Flight>, BoxError> {
        let rows: Vec<FlightRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM flights
            WHERE tenant_id = $1 AND course_id = $2
              AND tee_date BETWEEN $3 AND $4
              AND status <> 'CANCELLED'
            ORDER BY tee_date, tee_time, created_at
            "#,
            FLIGHT_COLUMNS
        ))
        .bind(tenant_id)
        .bind(course_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn count_booked_players(
        &self,
        tenant_id: Uuid,
        course_id: Uuid,
        tee_date: NaiveDate,
        tee_time: TeeTime,
        starting_hole: StartingHole,
    ) -> Result<u32, BoxError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(p.id)
            FROM flights f
            JOIN flight_players p ON p.flight_id = f.id
            WHERE f.tenant_id = $1 AND f.course_id = $2
              AND f.tee_date = $3 AND f.tee_time = $4 AND f.starting_hole = $5
              AND f.status <> 'CANCELLED'
            "#,
        )
        .bind(tenant_id)
        .bind(course_id)
        .bind(tee_date)
        .bind(tee_time.to_naive_time())
        .bind(i16::from(starting_hole.hole_number()))
        .fetch_one(&self.pool)
        .await?;

        narrow("booked players", count)
    }

    async fn next_booking_sequence(&self, tenant_id: Uuid, year: i32) -> Result<u32, BoxError> {
        let prefix = format!("TT-{}-", year);
        let pattern = format!("^{}[0-9]{{5,}}$", prefix);
        let digits_from = prefix.len() as i32 + 1;

        // First use seeds from the highest number already issued; after that
        // the row is the counter.
        let (value,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO booking_sequences (tenant_id, year, last_value)
            VALUES (
                $1, $2,
                1 + COALESCE((
                    SELECT MAX(CAST(SUBSTRING(booking_number FROM $4) AS INTEGER))
                    FROM flights
                    WHERE tenant_id = $1 AND booking_number ~ $3
                ), 0)
            )
            ON CONFLICT (tenant_id, year)
            DO UPDATE SET last_value = booking_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(tenant_id)
        .bind(year)
        .bind(pattern)
        .bind(digits_from)
        .fetch_one(&self.pool)
        .await?;

        debug!("Issued booking sequence {} for tenant {} in {}", value, tenant_id, year);
        narrow("booking sequence", value)
    }

    async fn insert_flight(&self, flight: &Flight) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO flights ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            FLIGHT_COLUMNS
        ))
        .bind(flight.id)
        .bind(flight.tenant_id)
        .bind(flight.course_id)
        .bind(&flight.booking_number)
        .bind(flight.tee_date)
        .bind(flight.tee_time.to_naive_time())
        .bind(i16::from(flight.starting_hole.hole_number()))
        .bind(i16::from(flight.holes))
        .bind(flight.status.as_str())
        .bind(flight.notes.as_deref())
        .bind(flight.cancelled_at)
        .bind(flight.cancelled_by.as_deref())
        .bind(flight.cancellation_reason.as_deref())
        .bind(flight.created_by.as_deref())
        .bind(flight.created_at)
        .bind(flight.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return Err(Box::new(DuplicateKey(flight.booking_number.clone())));
                }
            }
            return Err(e.into());
        }

        insert_players(&mut *tx, flight).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_flight(&self, flight: &Flight, expected: FlightStatus) -> Result<(), BoxError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE flights
            SET status = $3, notes = $4, cancelled_at = $5, cancelled_by = $6,
                cancellation_reason = $7, updated_at = $8
            WHERE id = $1 AND tenant_id = $2 AND status = $9
            "#,
        )
        .bind(flight.id)
        .bind(flight.tenant_id)
        .bind(flight.status.as_str())
        .bind(flight.notes.as_deref())
        .bind(flight.cancelled_at)
        .bind(flight.cancelled_by.as_deref())
        .bind(flight.cancellation_reason.as_deref())
        .bind(flight.updated_at)
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Box::new(StaleWrite(flight.id)));
        }

        sqlx::query("DELETE FROM flight_players WHERE flight_id = $1")
            .bind(flight.id)
            .execute(&mut *tx)
            .await?;
        insert_players(&mut *tx, flight).await?;

        tx.commit().await?;
        Ok(())
    }
}
