use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use teesheet_booking::BookingSettings;
use teesheet_core::memory::{InMemoryEventSink, InMemoryLockService, InMemoryStore};
use teesheet_schedule::InMemoryCache;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod courses;
pub mod error;
pub mod flights;
pub mod state;
pub mod tenant;

pub use state::{AppState, Backends};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(tenant::TENANT_HEADER),
            axum::http::HeaderName::from_static(tenant::ACTOR_HEADER),
        ]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(courses::routes())
        .merge(flights::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Everything in process: one store for courses, blocks and flights, a local
/// lock table and event log.
pub fn in_memory_state(
    store: Arc<InMemoryStore>,
    locks: Arc<InMemoryLockService>,
    events: Arc<InMemoryEventSink>,
    settings: BookingSettings,
) -> AppState {
    AppState::new(
        Backends {
            courses: store.clone(),
            blocks: store.clone(),
            flights: store,
            locks,
            events,
            cache: Arc::new(InMemoryCache::new()),
        },
        settings,
    )
}
