use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use teesheet_shared::Masked;
use uuid::Uuid;

use crate::tee_time::TeeTime;

/// Which nine a flight goes off. Front and back are independent capacity
/// pools when the sheet runs split tees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StartingHole {
    #[default]
    Front,
    Back,
}

impl StartingHole {
    pub fn hole_number(self) -> u8 {
        match self {
            Self::Front => 1,
            Self::Back => 10,
        }
    }
}

impl TryFrom<u8> for StartingHole {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Front),
            10 => Ok(Self::Back),
            other => Err(format!("starting hole must be 1 or 10, got {other}")),
        }
    }
}

impl From<StartingHole> for u8 {
    fn from(value: StartingHole) -> Self {
        value.hole_number()
    }
}

/// `PENDING → CONFIRMED → CHECKED_IN → IN_PROGRESS → COMPLETED`, with
/// `CANCELLED` and `NO_SHOW` reachable from anything before completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Pending,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl FlightStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Cancelled flights free their places; everything else holds them.
    pub fn holds_capacity(self) -> bool {
        self != Self::Cancelled
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use FlightStatus::*;
        match (self, next) {
            (from, Cancelled | NoShow) => !from.is_terminal(),
            (Pending, Confirmed) => true,
            (Confirmed, CheckedIn) => true,
            (CheckedIn, InProgress) => true,
            (InProgress, Completed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlightStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "CHECKED_IN" => Ok(Self::CheckedIn),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "NO_SHOW" => Ok(Self::NoShow),
            other => Err(format!("unknown flight status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerType {
    Member,
    Dependent,
    Guest,
    WalkUp,
}

/// Who is playing. The reference carried depends on the player type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "player_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerIdentity {
    Member {
        member_id: Uuid,
    },
    Dependent {
        dependent_id: Uuid,
    },
    Guest {
        guest_name: Masked<String>,
        #[serde(default)]
        guest_email: Option<Masked<String>>,
        #[serde(default)]
        sponsor_member_id: Option<Uuid>,
    },
    WalkUp {
        guest_name: Masked<String>,
    },
}

impl PlayerIdentity {
    pub fn player_type(&self) -> PlayerType {
        match self {
            Self::Member { .. } => PlayerType::Member,
            Self::Dependent { .. } => PlayerType::Dependent,
            Self::Guest { .. } => PlayerType::Guest,
            Self::WalkUp { .. } => PlayerType::WalkUp,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartRequest {
    #[default]
    None,
    Single,
    Shared,
    Walking,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaddyRequest {
    #[default]
    None,
    Forecaddie,
    Personal,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentalRequest {
    #[default]
    None,
    Clubs,
    Shoes,
    ClubsAndShoes,
}

/// A player as submitted by the caller, before it belongs to a flight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInput {
    pub position: u8,
    #[serde(flatten)]
    pub identity: PlayerIdentity,
    #[serde(default)]
    pub cart_request: CartRequest,
    #[serde(default)]
    pub caddy_request: CaddyRequest,
    #[serde(default)]
    pub rental_request: RentalRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: Uuid,
    /// 1..=4, unique inside its own flight only.
    pub position: u8,
    #[serde(flatten)]
    pub identity: PlayerIdentity,
    pub cart_request: CartRequest,
    pub caddy_request: CaddyRequest,
    pub rental_request: RentalRequest,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Player {
    pub fn from_input(input: PlayerInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            position: input.position,
            identity: input.identity,
            cart_request: input.cart_request,
            caddy_request: input.caddy_request,
            rental_request: input.rental_request,
            checked_in: false,
            checked_in_at: None,
        }
    }

    pub fn player_type(&self) -> PlayerType {
        self.identity.player_type()
    }
}

/// A tee-time booking party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub course_id: Uuid,
    /// `TT-<year>-<sequence>`, unique per tenant.
    pub booking_number: String,
    pub tee_date: NaiveDate,
    pub tee_time: TeeTime,
    pub starting_hole: StartingHole,
    pub holes: u8,
    pub status: FlightStatus,
    pub players: Vec<Player>,
    pub notes: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flight {
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            course_id: self.course_id,
            tee_date: self.tee_date,
            tee_time: self.tee_time,
            starting_hole: self.starting_hole,
        }
    }

    pub fn player_count(&self) -> u8 {
        self.players.len() as u8
    }
}

/// The capacity bucket `(course, date, time, nine)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub course_id: Uuid,
    pub tee_date: NaiveDate,
    pub tee_time: TeeTime,
    pub starting_hole: StartingHole,
}

impl SlotKey {
    /// Key for the booking lock. Both nines at one time share it.
    pub fn lock_key(&self) -> String {
        format!("slot:{}:{}:{}", self.course_id, self.tee_date, self.tee_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use FlightStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(CheckedIn));
        assert!(CheckedIn.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(Pending.can_transition_to(NoShow));

        assert!(!Pending.can_transition_to(CheckedIn));
        assert!(!Cancelled.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(NoShow));
        assert!(!NoShow.can_transition_to(Confirmed));
    }

    #[test]
    fn test_starting_hole_wire_format() {
        assert_eq!(serde_json::to_string(&StartingHole::Back).unwrap(), "10");
        assert_eq!(serde_json::from_str::<StartingHole>("1").unwrap(), StartingHole::Front);
        assert!(serde_json::from_str::<StartingHole>("5").is_err());
    }

    #[test]
    fn test_player_input_tagged_by_type() {
        let json = r#"{"position": 2, "player_type": "GUEST", "guest_name": "Pat Visitor"}"#;
        let input: PlayerInput = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(input.identity.player_type(), PlayerType::Guest);
        assert_eq!(input.cart_request, CartRequest::None);

        let json = r#"{"position": 1, "player_type": "WALK_UP", "guest_name": "Sam"}"#;
        let input: PlayerInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.identity.player_type(), PlayerType::WalkUp);

        // A member without a member id is rejected at the boundary.
        let json = r#"{"position": 1, "player_type": "MEMBER"}"#;
        assert!(serde_json::from_str::<PlayerInput>(json).is_err());
    }

    #[test]
    fn test_lock_key_format() {
        let key = SlotKey {
            course_id: Uuid::nil(),
            tee_date: NaiveDate::from_ymd_opt(2026, 7, 4).unwrap(),
            tee_time: TeeTime::from_hm(8, 10).unwrap(),
            starting_hole: StartingHole::Back,
        };
        assert_eq!(
            key.lock_key(),
            "slot:00000000-0000-0000-0000-000000000000:2026-07-04:08:10"
        );
    }
}
