use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::engine::assignment::IngestSummary;
use crate::error::AppError;
use crate::models::assignment::EmployeeSchedule;
use crate::models::employee::EmployeeWorkload;
use crate::models::patient::Patient;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/roster/employees", post(upload_employees))
        .route("/roster/patients", post(upload_patients))
        .route("/employees", get(list_employees))
        .route("/employees/:id/schedule", get(employee_schedule))
        .route("/patients", get(list_patients))
}

fn require_body(body: &str) -> Result<(), AppError> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("csv body cannot be empty".to_string()));
    }
    Ok(())
}

async fn upload_employees(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<IngestSummary>, AppError> {
    require_body(&body)?;
    Ok(Json(state.engine.load_employees(body.as_bytes())?))
}

async fn upload_patients(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<IngestSummary>, AppError> {
    require_body(&body)?;
    Ok(Json(state.engine.load_patients(body.as_bytes())?))
}

async fn list_employees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmployeeWorkload>>, AppError> {
    Ok(Json(state.engine.employees()?))
}

async fn list_patients(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Patient>>, AppError> {
    Ok(Json(state.engine.patients()?))
}

async fn employee_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EmployeeSchedule>, AppError> {
    Ok(Json(state.engine.employee_schedule(&id)?))
}
