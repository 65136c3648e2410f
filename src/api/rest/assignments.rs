use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::assignment::{Assignment, ServiceRequest};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/assignments",
            post(create_assignment)
                .get(list_assignments)
                .delete(clear_assignments),
        )
        .route("/assignments/prompt", post(create_from_prompt))
        .route("/assignments/validate", post(validate_assignment))
}

#[derive(Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub violations: Vec<String>,
}

async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ServiceRequest>,
) -> Result<Json<Assignment>, AppError> {
    if payload.patient_id.trim().is_empty() {
        return Err(AppError::BadRequest("patient_id cannot be empty".to_string()));
    }

    Ok(Json(state.engine.assign_one(&payload).await?))
}

async fn create_from_prompt(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PromptRequest>,
) -> Result<Json<Assignment>, AppError> {
    if payload.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt cannot be empty".to_string()));
    }

    Ok(Json(state.engine.assign_from_prompt(&payload.prompt).await?))
}

async fn list_assignments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Assignment>>, AppError> {
    Ok(Json(state.engine.current_assignments()?))
}

async fn clear_assignments(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.engine.clear_assignments()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn validate_assignment(
    State(state): State<Arc<AppState>>,
    Json(assignment): Json<Assignment>,
) -> Result<Json<ValidationResponse>, AppError> {
    let violations = state.engine.validate(&assignment)?;

    Ok(Json(ValidationResponse {
        valid: violations.is_empty(),
        violations,
    }))
}
