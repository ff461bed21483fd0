use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::BookingRules;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    rule_key: String,
    rule_value: Value,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlays `booking_rules` rows onto the file defaults. Rows look like
    /// `{"value": <number>}`; unknown keys and malformed values are skipped.
    pub async fn fetch_booking_rules(&self, defaults: BookingRules) -> Result<BookingRules, sqlx::Error> {
        let rows: Vec<RuleRow> = sqlx::query_as("SELECT rule_key, rule_value FROM booking_rules")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = defaults;
        for row in rows {
            apply_rule(&mut rules, &row.rule_key, &row.rule_value);
        }
        Ok(rules)
    }
}

fn apply_rule(rules: &mut BookingRules, key: &str, raw: &Value) {
    let Some(v) = raw.get("value") else {
        warn!("Booking rule {} has no value", key);
        return;
    };
    match key {
        "lock_ttl_seconds" => match v.as_u64() {
            Some(secs) if secs > 0 => rules.lock_ttl_seconds = secs,
            _ => warn!("Ignoring lock_ttl_seconds rule: {}", v),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_overlay() {
        let mut rules = BookingRules::default();
        apply_rule(&mut rules, "lock_ttl_seconds", &json!({ "value": 12 }));
        assert_eq!(rules.lock_ttl_seconds, 12);

        apply_rule(&mut rules, "lock_ttl_seconds", &json!({ "value": 0 }));
        apply_rule(&mut rules, "lock_ttl_seconds", &json!({ "value": "soon" }));
        apply_rule(&mut rules, "lock_ttl_seconds", &json!(45));
        apply_rule(&mut rules, "tax_rate", &json!({ "value": 0.2 }));
        assert_eq!(rules.lock_ttl_seconds, 12);
    }
}
