use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use teesheet_schedule::{DayOccupancy, TeeSheetSlot};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::tenant::CallerContext;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/courses/{course_id}/tee-sheet", get(get_tee_sheet))
        .route("/v1/courses/{course_id}/week-view", get(get_week_view))
        .route("/v1/courses/{course_id}/cache", delete(invalidate_cache))
}

#[derive(Debug, Deserialize)]
pub struct TeeSheetQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct WeekViewQuery {
    pub start: NaiveDate,
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    7
}

async fn get_tee_sheet(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(course_id): Path<Uuid>,
    Query(query): Query<TeeSheetQuery>,
) -> Result<Json<Vec<TeeSheetSlot>>, AppError> {
    let sheet = state.projector.tee_sheet(ctx.tenant_id, course_id, query.date).await?;
    Ok(Json(sheet))
}

async fn get_week_view(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(course_id): Path<Uuid>,
    Query(query): Query<WeekViewQuery>,
) -> Result<Json<Vec<DayOccupancy>>, AppError> {
    let week = state
        .projector
        .week_view_occupancy(ctx.tenant_id, course_id, query.start, query.days)
        .await?;
    Ok(Json(week))
}

/// Called by the admin side after a schedule is created, edited or removed.
async fn invalidate_cache(
    State(state): State<AppState>,
    ctx: CallerContext,
    Path(course_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    // Only the owner may flush; a foreign id reads as not found.
    state.directory.course(ctx.tenant_id, course_id).await?;
    state.directory.invalidate_course(course_id).await;
    state.directory.invalidate_schedules(course_id).await;
    info!("Course {} cache invalidated", course_id);
    Ok(StatusCode::NO_CONTENT)
}
