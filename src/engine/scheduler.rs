use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::engine::assignment::RotaEngine;
use crate::error::AppError;
use crate::models::assignment::{Assignment, ServiceRequest};
use crate::models::service::Urgency;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Drives the assignment pipeline once per patient, strictly sequentially. A second
/// run requested while one is in flight is rejected.
#[derive(Default)]
pub struct WeeklyScheduler {
    running: AtomicBool,
}

/// Returns the scheduler to `Idle` however the run ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WeeklyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub async fn generate(
        &self,
        engine: &RotaEngine,
        metrics: &Metrics,
    ) -> Result<Vec<Assignment>, AppError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::Conflict(
                "weekly schedule generation already running".to_string(),
            ));
        }
        let _guard = RunGuard(&self.running);

        let patients = match engine.patients() {
            Ok(patients) => patients,
            Err(err) => {
                metrics.schedule_runs_total.with_label_values(&["error"]).inc();
                return Err(err);
            }
        };

        engine.record(
            "weekly_schedule",
            "Starting weekly schedule generation",
            json!({ "patients": patients.len() }),
        );

        let mut assignments = Vec::new();
        let mut skipped = Vec::new();

        for patient in &patients {
            let Some(service) = patient.primary_service() else {
                warn!(patient_id = %patient.id, "patient lists no required service; skipping");
                skipped.push(json!({ "patient_id": patient.id, "reason": "no required service" }));
                continue;
            };

            let request = ServiceRequest {
                patient_id: patient.id.clone(),
                service_type: service,
                preferred_time: None,
                urgency: Urgency::Medium,
            };

            match engine.assign_one(&request).await {
                Ok(assignment) => assignments.push(assignment),
                Err(err) => {
                    warn!(patient_id = %patient.id, error = %err, "failed to assign patient; skipping");
                    skipped.push(json!({ "patient_id": patient.id, "reason": err.to_string() }));
                }
            }
        }

        assignments.sort_by_key(|assignment| assignment.start_time);

        engine.record(
            "weekly_schedule",
            "Completed weekly schedule",
            json!({ "assignments_count": assignments.len(), "skipped": skipped }),
        );
        metrics.schedule_runs_total.with_label_values(&["completed"]).inc();
        info!(
            assigned = assignments.len(),
            skipped = skipped.len(),
            "weekly schedule generated"
        );

        Ok(assignments)
    }
}
