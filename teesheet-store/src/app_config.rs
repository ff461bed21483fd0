use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub booking: BookingRules,
}

/// Operational knobs for the booking path. File values are defaults; rows in
/// `booking_rules` override them at startup.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BookingRules {
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_seconds: u64,
}

fn default_lock_ttl() -> u64 {
    30
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            lock_ttl_seconds: default_lock_ttl(),
        }
    }
}

impl BookingRules {
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Skip Postgres, Redis and Kafka and keep everything in process.
    #[serde(default)]
    pub in_memory: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub events_topic: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides, e.g. config/production.toml
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer-local, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // TEESHEET_BOOKING__LOCK_TTL_SECONDS=10 sets booking.lock_ttl_seconds
            .add_source(config::Environment::with_prefix("TEESHEET").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_section_defaults() {
        let raw = r#"
            [server]
            port = 8080
            [database]
            url = "postgres://localhost/teesheet"
            [redis]
            url = "redis://localhost"
            [kafka]
            brokers = "localhost:9092"
            events_topic = "flights"
        "#;
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.booking, BookingRules::default());
        assert_eq!(cfg.booking.lock_ttl(), Duration::from_secs(30));
        assert!(!cfg.server.in_memory);
    }
}
