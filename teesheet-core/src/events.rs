use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{DomainEvent, StoredEvent};
use crate::BoxError;

/// Append-only audit log.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn append(&self, event: DomainEvent) -> Result<StoredEvent, BoxError>;

    /// Events of one aggregate in append order.
    async fn events_for_aggregate(
        &self,
        tenant_id: Uuid,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, BoxError>;
}
