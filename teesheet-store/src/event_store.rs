use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use teesheet_core::events::EventSink;
use teesheet_core::{BoxError, DomainEvent, StoredEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Downstream copy of committed events.
#[async_trait]
pub trait EventForwarder: Send + Sync {
    async fn forward(&self, stored: &StoredEvent) -> Result<(), BoxError>;
}

/// Fans committed events out to a Kafka topic, keyed by aggregate id so one
/// flight's events stay ordered on a partition.
#[derive(Clone)]
pub struct EventPublisher {
    producer: FutureProducer,
    topic: String,
}

impl EventPublisher {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer, topic: topic.to_string() })
    }

    pub async fn publish(&self, stored: &StoredEvent) -> Result<(), BoxError> {
        let key = stored.event.aggregate_id.to_string();
        let payload = serde_json::to_string(stored)?;
        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                debug!(
                    "Published {} #{} to {}: partition {} offset {}",
                    stored.event.event_type, stored.sequence, self.topic, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => Err(e.into()),
        }
    }
}

#[async_trait]
impl EventForwarder for EventPublisher {
    async fn forward(&self, stored: &StoredEvent) -> Result<(), BoxError> {
        self.publish(stored).await
    }
}

/// Hands stored events to a background task that forwards them one at a
/// time, in append order. Appenders never wait on the broker.
#[derive(Clone)]
pub struct ForwardQueue {
    tx: mpsc::UnboundedSender<StoredEvent>,
}

impl ForwardQueue {
    pub fn spawn(forwarder: Arc<dyn EventForwarder>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<StoredEvent>();
        let handle = tokio::spawn(async move {
            while let Some(stored) = rx.recv().await {
                if let Err(e) = forwarder.forward(&stored).await {
                    warn!("Event #{} stored but not published: {}", stored.sequence, e);
                }
            }
            debug!("Event forwarder stopped");
        });
        (Self { tx }, handle)
    }

    pub fn enqueue(&self, stored: StoredEvent) {
        if let Err(e) = self.tx.send(stored) {
            warn!("Event #{} stored but the forwarder is gone", e.0.sequence);
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    sequence: i64,
    id: Uuid,
    tenant_id: Uuid,
    aggregate_type: String,
    aggregate_id: Uuid,
    event_type: String,
    payload: Value,
    actor: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        StoredEvent {
            sequence: row.sequence,
            event: DomainEvent {
                id: row.id,
                tenant_id: row.tenant_id,
                aggregate_type: row.aggregate_type,
                aggregate_id: row.aggregate_id,
                event_type: row.event_type,
                payload: row.payload,
                actor: row.actor,
                occurred_at: row.occurred_at,
            },
        }
    }
}

/// Append-only `domain_events` table. The row is the record of truth; the
/// Kafka copy is best-effort.
pub struct PgEventSink {
    pool: PgPool,
    forwarder: Option<ForwardQueue>,
}

impl PgEventSink {
    /// Must be called inside a Tokio runtime when a publisher is given.
    pub fn new(pool: PgPool, publisher: Option<EventPublisher>) -> Self {
        let forwarder = publisher.map(|p| ForwardQueue::spawn(Arc::new(p)).0);
        Self { pool, forwarder }
    }
}

#[async_trait]
impl EventSink for PgEventSink {
    async fn append(&self, event: DomainEvent) -> Result<StoredEvent, BoxError> {
        let (sequence,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO domain_events
                (id, tenant_id, aggregate_type, aggregate_id, event_type, payload, actor, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING sequence
            "#,
        )
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(&event.aggregate_type)
        .bind(event.aggregate_id)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.actor.as_deref())
        .bind(event.occurred_at)
        .fetch_one(&self.pool)
        .await?;

        let stored = StoredEvent { sequence, event };

        if let Some(forwarder) = &self.forwarder {
            forwarder.enqueue(stored.clone());
        }

        Ok(stored)
    }

    async fn events_for_aggregate(
        &self,
        tenant_id: Uuid,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, BoxError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT sequence, id, tenant_id, aggregate_type, aggregate_id, event_type, payload, actor, occurred_at
            FROM domain_events
            WHERE tenant_id = $1 AND aggregate_type = $2 AND aggregate_id = $3
            ORDER BY sequence
            "#,
        )
        .bind(tenant_id)
        .bind(aggregate_type)
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| error!("Failed to read events for {} {}: {}", aggregate_type, aggregate_id, e))?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }
}
