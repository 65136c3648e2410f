use std::collections::HashSet;
use std::io::Read;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::Local;
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::EngineSettings;
use crate::engine::builder::build_assignment;
use crate::engine::eligibility::{available, eligible_for};
use crate::engine::intent::{interpret_locally, to_service_request};
use crate::engine::scoring::{Candidate, CandidateScorer, RequestMeta, ScoringContext, ScoringError};
use crate::engine::validation::validate_assignment;
use crate::engine::workload::{WorkloadError, WorkloadTracker};
use crate::error::AppError;
use crate::ingest;
use crate::models::assignment::{Assignment, EmployeeSchedule, ScheduleSummary, ServiceRequest};
use crate::models::employee::{Employee, EmployeeWorkload};
use crate::models::operation::OperationLog;
use crate::models::patient::Patient;
use crate::observability::metrics::Metrics;
use crate::oracle::ReasoningOracle;
use crate::store::RotaStore;
use crate::travel::{RoutingService, TravelEstimator};

const WORKDAY_HOURS: f64 = 8.0;

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataStatus {
    pub has_data: bool,
    pub employees_count: usize,
    pub patients_count: usize,
    pub assignments_count: usize,
}

/// The per-request assignment pipeline plus the roster and assignment operations
/// around it.
pub struct RotaEngine {
    store: Arc<dyn RotaStore>,
    workload: WorkloadTracker,
    travel: TravelEstimator,
    scorer: CandidateScorer,
    interpreter: Option<Arc<dyn ReasoningOracle>>,
    oracle_timeout: Duration,
    default_capacity: u32,
    metrics: Metrics,
    /// Commits hold this shared. Roster reloads and clears hold it exclusively so a
    /// recount never interleaves with a half-finished commit.
    commit_gate: RwLock<()>,
}

impl RotaEngine {
    pub fn new(
        store: Arc<dyn RotaStore>,
        oracle: Option<Arc<dyn ReasoningOracle>>,
        routing: Option<Arc<dyn RoutingService>>,
        settings: &EngineSettings,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            workload: WorkloadTracker::new(),
            travel: TravelEstimator::new(
                routing,
                settings.routing_timeout,
                settings.default_travel_minutes,
                metrics.clone(),
            ),
            scorer: CandidateScorer::new(oracle.clone(), settings.oracle_timeout, metrics.clone()),
            interpreter: oracle,
            oracle_timeout: settings.oracle_timeout,
            default_capacity: settings.default_daily_capacity,
            metrics,
            commit_gate: RwLock::new(()),
        }
    }

    pub fn workload(&self) -> &WorkloadTracker {
        &self.workload
    }

    /// Replaces the employee table and re-registers capacities. Counts are rebuilt
    /// from the assignments already on record.
    pub fn load_employees<R: Read>(&self, reader: R) -> Result<IngestSummary, AppError> {
        let report = ingest::parse_employees(reader, self.default_capacity)?;
        let summary = IngestSummary {
            loaded: report.records.len(),
            skipped: report.skipped,
        };

        {
            let _reload = self.commit_gate.write().unwrap_or_else(PoisonError::into_inner);
            let existing = self.store.assignments()?;
            let existing_ids: Vec<&str> = existing
                .iter()
                .map(|assignment| assignment.employee_id.as_str())
                .collect();

            for employee_id in self.workload.register_roster(&report.records, &existing_ids) {
                warn!(employee_id = %employee_id, "existing assignment not counted");
            }
            self.store.store_employees(report.records)?;
        }

        self.record("data_upload", "Loaded employee roster", json!(summary));
        info!(loaded = summary.loaded, skipped = summary.skipped, "employees loaded");
        Ok(summary)
    }

    pub fn load_patients<R: Read>(&self, reader: R) -> Result<IngestSummary, AppError> {
        let report = ingest::parse_patients(reader)?;
        let summary = IngestSummary {
            loaded: report.records.len(),
            skipped: report.skipped,
        };

        self.store.store_patients(report.records)?;

        self.record("data_upload", "Loaded patient roster", json!(summary));
        info!(loaded = summary.loaded, skipped = summary.skipped, "patients loaded");
        Ok(summary)
    }

    pub fn employees(&self) -> Result<Vec<EmployeeWorkload>, AppError> {
        Ok(self
            .store
            .employees()?
            .into_iter()
            .map(|employee| EmployeeWorkload {
                current_assignments: self.workload.current(&employee.id),
                employee,
            })
            .collect())
    }

    pub fn patients(&self) -> Result<Vec<Patient>, AppError> {
        Ok(self.store.patients()?)
    }

    pub async fn assign_one(&self, request: &ServiceRequest) -> Result<Assignment, AppError> {
        let start = Instant::now();
        let result = self.run_pipeline(request).await;
        let outcome = if result.is_ok() { "success" } else { "error" };

        self.metrics
            .assignment_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        self.metrics
            .assignments_total
            .with_label_values(&[outcome])
            .inc();

        result
    }

    /// Free-text entry point. Interpretation falls back to local keyword matching when
    /// the oracle is absent, slow or returns garbage.
    pub async fn assign_from_prompt(&self, prompt: &str) -> Result<Assignment, AppError> {
        let intent = match &self.interpreter {
            Some(oracle) => match timeout(self.oracle_timeout, oracle.interpret(prompt)).await {
                Ok(Ok(intent)) if intent.patient_id.is_some() => intent,
                Ok(Ok(_)) => {
                    warn!("oracle found no patient in prompt; interpreting locally");
                    interpret_locally(prompt)
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "prompt interpretation failed; interpreting locally");
                    interpret_locally(prompt)
                }
                Err(_) => {
                    warn!("prompt interpretation timed out; interpreting locally");
                    interpret_locally(prompt)
                }
            },
            None => interpret_locally(prompt),
        };

        let request = to_service_request(intent).ok_or_else(|| {
            AppError::BadRequest("could not identify a patient id in the request".to_string())
        })?;

        let assignment = self.assign_one(&request).await?;
        self.record(
            "assignment_request",
            &format!("Processed prompt for patient {}", request.patient_id),
            json!({ "prompt": prompt, "service_type": request.service_type }),
        );
        Ok(assignment)
    }

    async fn run_pipeline(&self, request: &ServiceRequest) -> Result<Assignment, AppError> {
        let service = request.service_type;
        let patient = self
            .store
            .patient(&request.patient_id)?
            .ok_or_else(|| AppError::NotFound(format!("patient {} not found", request.patient_id)))?;

        let roster = self.store.employees()?;
        let eligible = eligible_for(service, &roster);
        if eligible.is_empty() {
            return Err(AppError::NoEligibleStaff(service));
        }

        let open = available(&eligible, &self.workload);
        if open.is_empty() {
            return Err(AppError::NoAvailableStaff);
        }

        let estimates = open.iter().map(|employee| {
            self.travel.estimate(
                &employee.home_location,
                &patient.home_location,
                employee.transport,
            )
        });
        let travel_times = join_all(estimates).await;

        let candidates: Vec<Candidate> = open
            .into_iter()
            .zip(travel_times)
            .map(|(employee, travel_minutes)| Candidate {
                current_assignments: self.workload.current(&employee.id),
                travel_minutes,
                employee,
            })
            .collect();

        let meta = RequestMeta {
            urgency: request.urgency,
            preferred_time: request.preferred_time.clone(),
        };
        let ctx = ScoringContext {
            patient: &patient,
            service,
            candidates: &candidates,
            request: &meta,
        };

        let score = self.scorer.score(&ctx).await.map_err(|err| match err {
            ScoringError::NoCandidates => AppError::NoAvailableStaff,
            other => AppError::Internal(other.to_string()),
        })?;

        let employee = candidates
            .iter()
            .map(|candidate| &candidate.employee)
            .find(|employee| employee.id == score.employee_id)
            .ok_or_else(|| {
                AppError::Internal(format!("selected employee {} vanished", score.employee_id))
            })?;

        let assignment = build_assignment(
            employee,
            &patient,
            service,
            &score,
            request.preferred_time.as_deref(),
            Local::now().naive_local(),
        );

        self.commit(employee, &assignment)?;

        self.record(
            "assignment",
            &format!("Assigned {} to patient {}", employee.id, patient.id),
            json!({ "service_type": service, "urgency": request.urgency }),
        );
        info!(
            patient_id = %patient.id,
            employee_id = %employee.id,
            service = %service,
            score = assignment.priority_score,
            "assignment created"
        );

        Ok(assignment)
    }

    /// Increments the workload (re-validated against capacity) then persists. A failed
    /// write gives the slot back.
    fn commit(&self, employee: &Employee, assignment: &Assignment) -> Result<(), AppError> {
        let _commit = self.commit_gate.read().unwrap_or_else(PoisonError::into_inner);

        self.workload
            .try_increment(&employee.id)
            .map_err(|err| match err {
                WorkloadError::CapacityExceeded(id) => AppError::CapacityExceeded(id),
                WorkloadError::UnknownEmployee(id) => {
                    AppError::NotFound(format!("employee {id} not found"))
                }
            })?;

        if let Err(err) = self.store.log_assignment(assignment) {
            self.workload.decrement(&employee.id);
            return Err(err.into());
        }

        self.metrics
            .employee_utilization
            .with_label_values(&[employee.id.as_str()])
            .set(self.workload.utilization(&employee.id));

        Ok(())
    }

    pub fn current_assignments(&self) -> Result<Vec<Assignment>, AppError> {
        Ok(self.store.assignments()?)
    }

    pub fn clear_assignments(&self) -> Result<(), AppError> {
        {
            let _clear = self.commit_gate.write().unwrap_or_else(PoisonError::into_inner);
            self.store.clear_assignments()?;
            self.workload.reset();
        }
        self.metrics.employee_utilization.reset();
        self.record("clear_assignments", "Cleared all assignments", json!({}));
        info!("cleared all assignments");
        Ok(())
    }

    pub fn validate(&self, assignment: &Assignment) -> Result<Vec<String>, AppError> {
        let employee = self.store.employee(&assignment.employee_id)?;
        let patient = self.store.patient(&assignment.patient_id)?;

        Ok(validate_assignment(
            assignment,
            employee.as_ref(),
            patient.as_ref(),
            &self.workload,
        ))
    }

    pub fn employee_schedule(&self, employee_id: &str) -> Result<EmployeeSchedule, AppError> {
        let employee = self
            .store
            .employee(employee_id)?
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id} not found")))?;

        let mut assignments: Vec<Assignment> = self
            .store
            .assignments()?
            .into_iter()
            .filter(|assignment| assignment.employee_id == employee_id)
            .collect();
        assignments.sort_by_key(|assignment| assignment.start_time);

        let working_minutes: u32 = assignments.iter().map(|a| a.duration_minutes).sum();
        let total_working_hours = f64::from(working_minutes) / 60.0;

        Ok(EmployeeSchedule {
            employee_id: employee.id,
            employee_name: employee.name,
            total_travel_minutes: assignments.iter().map(|a| a.travel_minutes).sum(),
            workload_percentage: total_working_hours / WORKDAY_HOURS * 100.0,
            total_working_hours,
            assignments,
        })
    }

    pub fn summary(&self) -> Result<ScheduleSummary, AppError> {
        let assignments = self.store.assignments()?;
        let employees: HashSet<&str> = assignments
            .iter()
            .map(|assignment| assignment.employee_id.as_str())
            .collect();

        Ok(ScheduleSummary {
            total_assignments: assignments.len(),
            employees_involved: employees.len(),
            average_assignments_per_employee: assignments.len() as f64
                / employees.len().max(1) as f64,
        })
    }

    pub fn status(&self) -> Result<DataStatus, AppError> {
        let employees_count = self.store.employees()?.len();
        let patients_count = self.store.patients()?.len();

        Ok(DataStatus {
            has_data: employees_count > 0 && patients_count > 0,
            employees_count,
            patients_count,
            assignments_count: self.store.assignments()?.len(),
        })
    }

    pub fn operations(&self) -> Result<Vec<OperationLog>, AppError> {
        Ok(self.store.operations()?)
    }

    pub fn clear_all(&self) -> Result<(), AppError> {
        {
            let _clear = self.commit_gate.write().unwrap_or_else(PoisonError::into_inner);
            self.store.clear_all()?;
            self.workload.forget_all();
        }
        self.metrics.employee_utilization.reset();
        info!("cleared all data");
        Ok(())
    }

    /// Operation logging is observability only; a failed write never fails the caller.
    pub(crate) fn record(&self, kind: &str, description: &str, details: serde_json::Value) {
        if let Err(err) = self.store.log_operation(kind, description, details) {
            warn!(kind, error = %err, "failed to record operation");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::RotaEngine;
    use crate::config::EngineSettings;
    use crate::error::AppError;
    use crate::models::assignment::ServiceRequest;
    use crate::models::service::{Qualification, ServiceType, Urgency};
    use crate::observability::metrics::Metrics;
    use crate::oracle::testing::SlowOracle;
    use crate::store::testing::FlakyStore;
    use crate::store::{MemoryStore, StoreError};

    const EMPLOYEES: &str = "EmployeeID,Name,Address,TransportMode,Qualification,LanguageSpoken,MaxPatientsPerDay\n\
        E1,Cara,Leeds,Car,Carer,English,1\n\
        E2,Nina,York,Car,Nurse,\"English, Polish\",2\n";

    const PATIENTS: &str = "PatientID,PatientName,Address,RequiredSupport,LanguagePreference\n\
        P1,Alice,Leeds,Medicine,English\n\
        P2,Bob,York,Exercise,Polish\n";

    fn engine() -> RotaEngine {
        let engine = RotaEngine::new(
            Arc::new(MemoryStore::new()),
            None,
            None,
            &EngineSettings::default(),
            Metrics::new(),
        );
        engine.load_employees(EMPLOYEES.as_bytes()).unwrap();
        engine.load_patients(PATIENTS.as_bytes()).unwrap();
        engine
    }

    fn request(patient_id: &str, service: ServiceType) -> ServiceRequest {
        ServiceRequest {
            patient_id: patient_id.to_string(),
            service_type: service,
            preferred_time: None,
            urgency: Urgency::Medium,
        }
    }

    #[tokio::test]
    async fn medicine_is_always_assigned_to_a_nurse() {
        let engine = engine();

        let assignment = engine
            .assign_one(&request("P1", ServiceType::Medicine))
            .await
            .unwrap();

        let nurse = engine
            .employees()
            .unwrap()
            .into_iter()
            .find(|e| e.employee.id == assignment.employee_id)
            .unwrap();
        assert_eq!(nurse.employee.qualification, Qualification::Nurse);
        assert_eq!(nurse.current_assignments, 1);
    }

    #[tokio::test]
    async fn capacity_exhaustion_surfaces_no_available_staff() {
        let engine = engine();

        engine.assign_one(&request("P1", ServiceType::Medicine)).await.unwrap();
        engine.assign_one(&request("P1", ServiceType::Medicine)).await.unwrap();
        let third = engine.assign_one(&request("P1", ServiceType::Medicine)).await;

        assert!(matches!(third, Err(AppError::NoAvailableStaff)));
        assert!(engine
            .employees()
            .unwrap()
            .iter()
            .all(|e| e.current_assignments <= e.employee.daily_capacity));
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found() {
        let result = engine().assign_one(&request("P404", ServiceType::Exercise)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn clearing_assignments_restores_capacity() {
        let engine = engine();
        engine.assign_one(&request("P2", ServiceType::Exercise)).await.unwrap();

        engine.clear_assignments().unwrap();

        assert!(engine.current_assignments().unwrap().is_empty());
        assert!(engine.employees().unwrap().iter().all(|e| e.current_assignments == 0));
    }

    #[tokio::test]
    async fn reloading_roster_recounts_existing_assignments() {
        let engine = engine();
        let assignment = engine
            .assign_one(&request("P2", ServiceType::Exercise))
            .await
            .unwrap();

        engine.load_employees(EMPLOYEES.as_bytes()).unwrap();

        assert_eq!(engine.workload().current(&assignment.employee_id), 1);
    }

    #[tokio::test]
    async fn prompt_without_oracle_is_interpreted_locally() {
        let engine = engine();

        let assignment = engine
            .assign_from_prompt("Patient P2 needs exercise this afternoon")
            .await
            .unwrap();

        assert_eq!(assignment.patient_id, "P2");
        assert_eq!(assignment.service_type, ServiceType::Exercise);
    }

    #[tokio::test]
    async fn employee_schedule_totals_duration_and_travel() {
        let engine = engine();
        let assignment = engine
            .assign_one(&request("P2", ServiceType::Exercise))
            .await
            .unwrap();

        let schedule = engine.employee_schedule(&assignment.employee_id).unwrap();

        assert_eq!(schedule.assignments.len(), 1);
        assert_eq!(schedule.total_travel_minutes, 15);
        assert!((schedule.total_working_hours - 0.5).abs() < 1e-9);
        assert!((schedule.workload_percentage - 6.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn concurrent_requests_cannot_overfill_the_last_slot() {
        let engine = RotaEngine::new(
            Arc::new(MemoryStore::new()),
            Some(Arc::new(SlowOracle {
                delay: Duration::from_millis(50),
            })),
            None,
            &EngineSettings::default(),
            Metrics::new(),
        );
        engine
            .load_employees("EmployeeID,Name,Qualification,MaxPatientsPerDay\nE1,Nia,Nurse,1\n".as_bytes())
            .unwrap();
        engine
            .load_patients("PatientID,PatientName,RequiredSupport\nP1,Alice,Medicine\nP2,Bob,Medicine\n".as_bytes())
            .unwrap();

        // Both requests see E1 with headroom before either one commits.
        let request_p1 = request("P1", ServiceType::Medicine);
        let request_p2 = request("P2", ServiceType::Medicine);
        let (first, second) = tokio::join!(
            engine.assign_one(&request_p1),
            engine.assign_one(&request_p2),
        );
        let outcomes = [first, second];

        let committed: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].employee_id, "E1");
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::CapacityExceeded(id)) if id == "E1")));
        assert_eq!(engine.workload().current("E1"), 1);
        assert_eq!(engine.current_assignments().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_write_gives_the_slot_back() {
        let engine = RotaEngine::new(
            Arc::new(FlakyStore {
                fail_assignment_writes: true,
                ..FlakyStore::default()
            }),
            None,
            None,
            &EngineSettings::default(),
            Metrics::new(),
        );
        engine.load_employees(EMPLOYEES.as_bytes()).unwrap();
        engine.load_patients(PATIENTS.as_bytes()).unwrap();

        let result = engine.assign_one(&request("P1", ServiceType::Medicine)).await;

        assert!(matches!(
            result,
            Err(AppError::Storage(StoreError::Unavailable(_)))
        ));
        assert_eq!(engine.workload().current("E2"), 0);
        assert!(engine.current_assignments().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reload_keeps_counts_for_employees_still_on_roster() {
        let engine = engine();
        engine.assign_one(&request("P1", ServiceType::Medicine)).await.unwrap();

        engine.load_employees(EMPLOYEES.as_bytes()).unwrap();
        engine.load_employees(EMPLOYEES.as_bytes()).unwrap();

        assert_eq!(engine.workload().current("E2"), 1);
        assert_eq!(engine.workload().current("E1"), 0);
    }
}
