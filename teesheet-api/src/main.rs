use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use teesheet_api::{app, in_memory_state, AppState, Backends};
use teesheet_booking::BookingSettings;
use teesheet_core::memory::{InMemoryEventSink, InMemoryLockService, InMemoryStore};
use teesheet_schedule::InMemoryCache;
use teesheet_store::{
    Config, DbClient, EventPublisher, PgCourseRepository, PgEventSink, PgFlightRepository, RedisClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teesheet_api=debug,teesheet_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting tee sheet API on port {}", config.server.port);

    let state = if config.server.in_memory {
        in_memory(&config)
    } else {
        connect(&config).await?
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn in_memory(config: &Config) -> AppState {
    tracing::warn!("Running with in-process storage; nothing survives a restart");
    let locks = Arc::new(InMemoryLockService::new());
    locks.clone().spawn_reaper(Duration::from_secs(5));

    in_memory_state(
        Arc::new(InMemoryStore::new()),
        locks,
        Arc::new(InMemoryEventSink::new()),
        BookingSettings {
            lock_ttl: config.booking.lock_ttl(),
        },
    )
}

async fn connect(config: &Config) -> anyhow::Result<AppState> {
    let db = DbClient::new(&config.database.url)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let rules = db
        .fetch_booking_rules(config.booking.clone())
        .await
        .context("Failed to load booking rules")?;
    tracing::info!("Slot lock TTL {}s", rules.lock_ttl_seconds);

    let redis = RedisClient::new(&config.redis.url)
        .await
        .context("Failed to connect to Redis")?;

    let publisher = match EventPublisher::new(&config.kafka.brokers, &config.kafka.events_topic) {
        Ok(publisher) => Some(publisher),
        Err(e) => {
            tracing::warn!("Kafka unavailable, events will only be stored: {}", e);
            None
        }
    };

    let courses = Arc::new(PgCourseRepository::new(db.pool.clone()));
    Ok(AppState::new(
        Backends {
            courses: courses.clone(),
            blocks: courses,
            flights: Arc::new(PgFlightRepository::new(db.pool.clone())),
            locks: Arc::new(redis),
            events: Arc::new(PgEventSink::new(db.pool.clone(), publisher)),
            cache: Arc::new(InMemoryCache::new()),
        },
        BookingSettings {
            lock_ttl: rules.lock_ttl(),
        },
    ))
}
