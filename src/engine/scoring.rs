use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

use crate::models::assignment::CandidateScore;
use crate::models::employee::Employee;
use crate::models::patient::Patient;
use crate::models::service::{ServiceType, Urgency};
use crate::observability::metrics::Metrics;
use crate::oracle::{OracleError, OracleRequest, PatientBrief, RankedCandidate, ReasoningOracle};

pub const FALLBACK_PRIORITY_SCORE: f64 = 5.0;
pub const FALLBACK_TRAVEL_MINUTES: u32 = 15;
pub const FALLBACK_DURATION_MINUTES: u32 = 30;
pub const FALLBACK_JUSTIFICATION: &str =
    "Automatic selection: reasoning service unavailable, first available qualified employee";

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("no candidates to score")]
    NoCandidates,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("proposal names employee {0} outside the candidate set")]
    UnknownCandidate(String),

    #[error("proposal is malformed: {0}")]
    Malformed(String),
}

/// An eligible, available employee with everything the scorer needs about them.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub employee: Employee,
    pub current_assignments: u32,
    pub travel_minutes: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub urgency: Urgency,
    pub preferred_time: Option<String>,
}

pub struct ScoringContext<'a> {
    pub patient: &'a Patient,
    pub service: ServiceType,
    /// Filter order, which is roster order.
    pub candidates: &'a [Candidate],
    pub request: &'a RequestMeta,
}

#[async_trait]
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn select(&self, ctx: &ScoringContext<'_>) -> Result<CandidateScore, ScoringError>;
}

fn speaks_preference(candidate: &Candidate, patient: &Patient) -> bool {
    patient.prefers_default_language() || candidate.employee.speaks(&patient.preferred_language)
}

fn same_location(candidate: &Candidate, patient: &Patient) -> bool {
    let home = candidate.employee.home_location.trim();
    !home.is_empty() && home.eq_ignore_ascii_case(patient.home_location.trim())
}

fn headroom(candidate: &Candidate) -> u32 {
    candidate
        .employee
        .daily_capacity
        .saturating_sub(candidate.current_assignments)
}

/// Lexicographic comparison: each criterion strictly dominates the next. `Less`
/// means `a` ranks ahead of `b`.
fn compare(a: &Candidate, b: &Candidate, patient: &Patient, service: ServiceType) -> Ordering {
    let qualification = if service.requires_nurse() {
        Ordering::Equal
    } else {
        b.employee.qualification.cmp(&a.employee.qualification)
    };

    qualification
        .then_with(|| a.travel_minutes.cmp(&b.travel_minutes))
        .then_with(|| same_location(b, patient).cmp(&same_location(a, patient)))
        .then_with(|| speaks_preference(b, patient).cmp(&speaks_preference(a, patient)))
        .then_with(|| headroom(b).cmp(&headroom(a)))
}

/// Ranks candidates best-first. The sort is stable, so residual ties keep roster order.
pub fn rank_candidates(
    patient: &Patient,
    service: ServiceType,
    candidates: &[Candidate],
) -> Vec<RankedCandidate> {
    let mut ordered: Vec<&Candidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| compare(a, b, patient, service));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| RankedCandidate {
            rank: index + 1,
            id: candidate.employee.id.clone(),
            name: candidate.employee.name.clone(),
            qualification: candidate.employee.qualification.label(),
            languages: candidate.employee.languages.clone(),
            speaks_preferred_language: speaks_preference(candidate, patient),
            transport: candidate.employee.transport.label(),
            location: candidate.employee.home_location.clone(),
            current_assignments: candidate.current_assignments,
            daily_capacity: candidate.employee.daily_capacity,
            travel_minutes: candidate.travel_minutes,
        })
        .collect()
}

/// Delegates the choice to the external reasoning oracle and validates its answer.
pub struct OracleStrategy {
    oracle: Arc<dyn ReasoningOracle>,
}

impl OracleStrategy {
    pub fn new(oracle: Arc<dyn ReasoningOracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl ScoringStrategy for OracleStrategy {
    fn name(&self) -> &'static str {
        "oracle"
    }

    async fn select(&self, ctx: &ScoringContext<'_>) -> Result<CandidateScore, ScoringError> {
        if ctx.candidates.is_empty() {
            return Err(ScoringError::NoCandidates);
        }

        let request = OracleRequest {
            patient: PatientBrief {
                id: ctx.patient.id.clone(),
                name: ctx.patient.name.clone(),
                location: ctx.patient.home_location.clone(),
                preferred_language: ctx.patient.preferred_language.clone(),
                priority: ctx.patient.priority,
            },
            service_type: ctx.service,
            urgency: ctx.request.urgency,
            preferred_time: ctx.request.preferred_time.clone(),
            candidates: rank_candidates(ctx.patient, ctx.service, ctx.candidates),
        };

        let proposal = self.oracle.propose(&request).await?;

        if !ctx
            .candidates
            .iter()
            .any(|candidate| candidate.employee.id == proposal.employee_id)
        {
            return Err(ScoringError::UnknownCandidate(proposal.employee_id));
        }
        if !proposal.priority_score.is_finite() {
            return Err(ScoringError::Malformed("non-finite priority score".to_string()));
        }
        if proposal.duration_minutes == 0 {
            return Err(ScoringError::Malformed("zero service duration".to_string()));
        }

        Ok(CandidateScore {
            employee_id: proposal.employee_id,
            priority_score: proposal.priority_score,
            travel_minutes: proposal.travel_minutes,
            justification: proposal.justification,
            duration_minutes: proposal.duration_minutes,
        })
    }
}

/// Deterministic local choice: first candidate in filter order, fixed placeholders.
pub struct FallbackStrategy;

#[async_trait]
impl ScoringStrategy for FallbackStrategy {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn select(&self, ctx: &ScoringContext<'_>) -> Result<CandidateScore, ScoringError> {
        let first = ctx.candidates.first().ok_or(ScoringError::NoCandidates)?;

        Ok(CandidateScore {
            employee_id: first.employee.id.clone(),
            priority_score: FALLBACK_PRIORITY_SCORE,
            travel_minutes: FALLBACK_TRAVEL_MINUTES,
            justification: FALLBACK_JUSTIFICATION.to_string(),
            duration_minutes: FALLBACK_DURATION_MINUTES,
        })
    }
}

pub struct CandidateScorer {
    primary: Option<Box<dyn ScoringStrategy>>,
    fallback: Box<dyn ScoringStrategy>,
    timeout: Duration,
    metrics: Metrics,
}

impl CandidateScorer {
    pub fn new(oracle: Option<Arc<dyn ReasoningOracle>>, timeout: Duration, metrics: Metrics) -> Self {
        Self {
            primary: oracle.map(|oracle| Box::new(OracleStrategy::new(oracle)) as Box<dyn ScoringStrategy>),
            fallback: Box::new(FallbackStrategy),
            timeout,
            metrics,
        }
    }

    /// Always yields a selection for a non-empty candidate set; the primary strategy is
    /// bounded by the timeout and any failure resolves to the fallback.
    pub async fn score(&self, ctx: &ScoringContext<'_>) -> Result<CandidateScore, ScoringError> {
        if ctx.candidates.is_empty() {
            return Err(ScoringError::NoCandidates);
        }

        if let Some(primary) = &self.primary {
            let reason = match timeout(self.timeout, primary.select(ctx)).await {
                Ok(Ok(score)) => return Ok(score),
                Ok(Err(err)) => {
                    warn!(
                        strategy = primary.name(),
                        patient_id = %ctx.patient.id,
                        error = %err,
                        "scoring strategy failed; using fallback"
                    );
                    "error"
                }
                Err(_) => {
                    warn!(
                        strategy = primary.name(),
                        patient_id = %ctx.patient.id,
                        "scoring strategy timed out; using fallback"
                    );
                    "timeout"
                }
            };
            self.metrics
                .scoring_fallbacks_total
                .with_label_values(&[reason])
                .inc();
        } else {
            self.metrics
                .scoring_fallbacks_total
                .with_label_values(&["unconfigured"])
                .inc();
        }

        self.fallback.select(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{
        Candidate, CandidateScorer, FALLBACK_DURATION_MINUTES, FALLBACK_PRIORITY_SCORE,
        FALLBACK_TRAVEL_MINUTES, RequestMeta, ScoringContext, ScoringError, rank_candidates,
    };
    use crate::models::employee::Employee;
    use crate::models::patient::Patient;
    use crate::models::service::{Qualification, ServiceType, TransportMode};
    use crate::observability::metrics::Metrics;
    use crate::oracle::{OracleError, OracleProposal, OracleRequest, ReasoningOracle, RequestIntent};

    fn candidate(
        id: &str,
        qualification: Qualification,
        languages: &[&str],
        location: &str,
        load: u32,
        capacity: u32,
        travel: u32,
    ) -> Candidate {
        Candidate {
            employee: Employee {
                id: id.to_string(),
                name: format!("Employee {id}"),
                qualification,
                languages: languages.iter().map(|l| l.to_string()).collect(),
                transport: TransportMode::Car,
                home_location: location.to_string(),
                post_code: String::new(),
                daily_capacity: capacity,
            },
            current_assignments: load,
            travel_minutes: travel,
        }
    }

    fn patient(language: &str) -> Patient {
        Patient {
            id: "P001".to_string(),
            name: "Alice".to_string(),
            required_services: vec![ServiceType::Exercise],
            preferred_language: language.to_string(),
            home_location: "12 High St".to_string(),
            post_code: String::new(),
            priority: 1,
        }
    }

    fn ranked_ids(patient: &Patient, service: ServiceType, candidates: &[Candidate]) -> Vec<String> {
        rank_candidates(patient, service, candidates)
            .into_iter()
            .map(|ranked| ranked.id)
            .collect()
    }

    #[test]
    fn qualification_dominates_travel_for_non_medicine() {
        let candidates = vec![
            candidate("E1", Qualification::Carer, &["English"], "x", 0, 4, 5),
            candidate("E2", Qualification::Nurse, &["English"], "y", 0, 4, 40),
        ];

        assert_eq!(
            ranked_ids(&patient("English"), ServiceType::Exercise, &candidates),
            vec!["E2", "E1"]
        );
    }

    #[test]
    fn travel_then_location_then_language_then_headroom() {
        let p = patient("Polish");
        let candidates = vec![
            candidate("E1", Qualification::Carer, &["English"], "elsewhere", 0, 4, 10),
            candidate("E2", Qualification::Carer, &["English"], "12 High St", 0, 4, 10),
            candidate("E3", Qualification::Carer, &["Polish"], "elsewhere", 3, 4, 10),
            candidate("E4", Qualification::Carer, &["Polish"], "elsewhere", 0, 4, 10),
            candidate("E5", Qualification::Carer, &["Polish"], "elsewhere", 0, 4, 3),
        ];

        assert_eq!(
            ranked_ids(&p, ServiceType::Companionship, &candidates),
            vec!["E5", "E2", "E4", "E3", "E1"]
        );
    }

    #[test]
    fn residual_ties_keep_roster_order() {
        let candidates = vec![
            candidate("E1", Qualification::Carer, &["English"], "a", 1, 4, 10),
            candidate("E2", Qualification::Carer, &["English"], "b", 1, 4, 10),
        ];

        assert_eq!(
            ranked_ids(&patient("English"), ServiceType::Exercise, &candidates),
            vec!["E1", "E2"]
        );
    }

    enum Behaviour {
        Propose(OracleProposal),
        Fail,
        Stall,
    }

    struct StubOracle {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl StubOracle {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReasoningOracle for StubOracle {
        async fn propose(&self, _request: &OracleRequest) -> Result<OracleProposal, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Propose(proposal) => Ok(proposal.clone()),
                Behaviour::Fail => Err(OracleError::EmptyResponse),
                Behaviour::Stall => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(OracleError::EmptyResponse)
                }
            }
        }

        async fn interpret(&self, _prompt: &str) -> Result<RequestIntent, OracleError> {
            Err(OracleError::EmptyResponse)
        }
    }

    fn proposal(employee_id: &str, duration: u32) -> OracleProposal {
        OracleProposal {
            employee_id: employee_id.to_string(),
            justification: "best match".to_string(),
            priority_score: 8.0,
            travel_minutes: 9,
            duration_minutes: duration,
        }
    }

    fn scorer(oracle: Option<Arc<StubOracle>>) -> CandidateScorer {
        CandidateScorer::new(
            oracle.map(|oracle| oracle as Arc<dyn ReasoningOracle>),
            Duration::from_millis(50),
            Metrics::new(),
        )
    }

    fn pool() -> Vec<Candidate> {
        vec![
            candidate("E1", Qualification::Carer, &["English"], "a", 0, 4, 30),
            candidate("E2", Qualification::Nurse, &["English"], "b", 0, 4, 5),
        ]
    }

    #[tokio::test]
    async fn oracle_selection_is_used_when_valid() {
        let p = patient("English");
        let candidates = pool();
        let meta = RequestMeta::default();
        let ctx = ScoringContext {
            patient: &p,
            service: ServiceType::Exercise,
            candidates: &candidates,
            request: &meta,
        };

        let score = scorer(Some(StubOracle::new(Behaviour::Propose(proposal("E2", 45)))))
            .score(&ctx)
            .await
            .unwrap();

        assert_eq!(score.employee_id, "E2");
        assert_eq!(score.duration_minutes, 45);
        assert_eq!(score.travel_minutes, 9);
    }

    #[tokio::test]
    async fn fallback_is_deterministic_across_failure_modes() {
        let p = patient("English");
        let candidates = pool();
        let meta = RequestMeta::default();
        let ctx = ScoringContext {
            patient: &p,
            service: ServiceType::Exercise,
            candidates: &candidates,
            request: &meta,
        };

        let scorers = [
            scorer(None),
            scorer(Some(StubOracle::new(Behaviour::Fail))),
            scorer(Some(StubOracle::new(Behaviour::Stall))),
            scorer(Some(StubOracle::new(Behaviour::Propose(proposal("E99", 30))))),
            scorer(Some(StubOracle::new(Behaviour::Propose(proposal("E2", 0))))),
        ];

        for scorer in &scorers {
            let score = scorer.score(&ctx).await.unwrap();
            assert_eq!(score.employee_id, "E1");
            assert_eq!(score.priority_score, FALLBACK_PRIORITY_SCORE);
            assert_eq!(score.travel_minutes, FALLBACK_TRAVEL_MINUTES);
            assert_eq!(score.duration_minutes, FALLBACK_DURATION_MINUTES);
        }
    }

    #[tokio::test]
    async fn empty_candidate_set_fails_without_consulting_oracle() {
        let p = patient("English");
        let meta = RequestMeta::default();
        let ctx = ScoringContext {
            patient: &p,
            service: ServiceType::Exercise,
            candidates: &[],
            request: &meta,
        };
        let oracle = StubOracle::new(Behaviour::Propose(proposal("E1", 30)));

        let result = scorer(Some(oracle.clone())).score(&ctx).await;

        assert!(matches!(result, Err(ScoringError::NoCandidates)));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }
}
