use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use teesheet_booking::CreateFlightRequest;
use teesheet_core::{Flight, PlayerInput, StoredEvent};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::tenant::CallerContext;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", post(create_flight))
        .route("/v1/flights/{id}", get(get_flight))
        .route("/v1/flights/{id}/players", put(update_players))
        .route("/v1/flights/{id}/cancel", post(cancel_flight))
        .route("/v1/flights/{id}/check-in", post(check_in_flight))
        .route("/v1/flights/{id}/start", post(start_play))
        .route("/v1/flights/{id}/complete", post(complete_flight))
        .route("/v1/flights/{id}/no-show", post(mark_no_show))
        .route("/v1/flights/{id}/events", get(flight_events))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlayersRequest {
    pub players: Vec<PlayerInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

async fn create_flight(
    State(state): State<AppState>,
    ctx: CallerContext,
    Json(req): Json<CreateFlightRequest>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    let flight = state.bookings.create_flight(ctx.tenant_id, req, ctx.actor()).await?;
    Ok((StatusCode::CREATED, Json(flight)))
}

async fn get_flight(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.lifecycle.get_flight(ctx.tenant_id, id).await?))
}

async fn update_players(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlayersRequest>,
) -> Result<Json<Flight>, AppError> {
    let flight = state
        .lifecycle
        .update_players(ctx.tenant_id, id, req.players, ctx.actor())
        .await?;
    Ok(Json(flight))
}

async fn cancel_flight(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<Flight>, AppError> {
    let Json(req) = body.unwrap_or_default();
    let flight = state.lifecycle.cancel(ctx.tenant_id, id, req.reason, ctx.actor()).await?;
    Ok(Json(flight))
}

async fn check_in_flight(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.lifecycle.check_in(ctx.tenant_id, id, ctx.actor()).await?))
}

async fn start_play(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.lifecycle.start_play(ctx.tenant_id, id, ctx.actor()).await?))
}

async fn complete_flight(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.lifecycle.complete(ctx.tenant_id, id, ctx.actor()).await?))
}

async fn mark_no_show(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.lifecycle.mark_no_show(ctx.tenant_id, id, ctx.actor()).await?))
}

async fn flight_events(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StoredEvent>>, AppError> {
    Ok(Json(state.lifecycle.history(ctx.tenant_id, id).await?))
}
