pub mod assignments;
pub mod roster;
pub mod schedule;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::engine::assignment::DataStatus;
use crate::engine::scheduler::SchedulerState;
use crate::error::AppError;
use crate::models::operation::OperationLog;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(roster::router())
        .merge(assignments::router())
        .merge(schedule::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/status", get(status))
        .route("/operations", get(operations))
        .route("/reset", post(reset))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    scheduler: SchedulerState,
    employees: usize,
    patients: usize,
    assignments: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let status = state.engine.status()?;

    Ok(Json(HealthResponse {
        status: "ok",
        scheduler: state.scheduler.state(),
        employees: status.employees_count,
        patients: status.patients_count,
        assignments: status.assignments_count,
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Result<Json<DataStatus>, AppError> {
    Ok(Json(state.engine.status()?))
}

async fn operations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OperationLog>>, AppError> {
    Ok(Json(state.engine.operations()?))
}

async fn reset(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    state.engine.clear_all()?;
    Ok(Json(json!({ "message": "all data cleared" })))
}
