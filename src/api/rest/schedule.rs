use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::error::AppError;
use crate::models::assignment::{Assignment, ScheduleSummary};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/schedule/weekly", post(generate_weekly))
        .route("/schedule/summary", get(summary))
}

async fn generate_weekly(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let schedule = state
        .scheduler
        .generate(&state.engine, &state.metrics)
        .await?;

    Ok(Json(schedule))
}

async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<ScheduleSummary>, AppError> {
    Ok(Json(state.engine.summary()?))
}
