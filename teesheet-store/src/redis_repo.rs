use async_trait::async_trait;
use std::time::Duration;
use teesheet_core::lock::LockService;
use teesheet_core::BoxError;
use tracing::{debug, warn};

/// Deletes the key only while it still carries the caller's token.
const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// `SET key owner NX EX ttl`. Redis expires the key if the owner never
    /// comes back.
    pub async fn acquire_slot_lock(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(owner)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        Ok(result.is_some())
    }

    /// Returns whether the key was deleted.
    pub async fn release_slot_lock(&self, key: &str, owner: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(key)
            .arg(owner)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}

#[async_trait]
impl LockService for RedisClient {
    async fn acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, BoxError> {
        let acquired = self.acquire_slot_lock(key, owner, ttl).await?;
        debug!("Slot lock {} acquired={}", key, acquired);
        Ok(acquired)
    }

    async fn release(&self, key: &str, owner: &str) -> Result<(), BoxError> {
        if !self.release_slot_lock(key, owner).await? {
            warn!("Slot lock {} had already lapsed or changed hands", key);
        }
        Ok(())
    }
}
