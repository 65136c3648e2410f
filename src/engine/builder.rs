use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::warn;
use uuid::Uuid;

use crate::models::assignment::{Assignment, CandidateScore};
use crate::models::employee::Employee;
use crate::models::patient::Patient;
use crate::models::service::ServiceType;

/// Resolves the visit start: a valid `HH:MM` preference on today's date, otherwise
/// one hour after `now`.
pub fn resolve_start(preferred_time: Option<&str>, now: NaiveDateTime) -> NaiveDateTime {
    let Some(raw) = preferred_time.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return now + Duration::hours(1);
    };

    match NaiveTime::parse_from_str(raw, "%H:%M") {
        Ok(time) => now.date().and_time(time),
        Err(err) => {
            warn!(preferred_time = raw, error = %err, "unparseable preferred time; defaulting");
            now + Duration::hours(1)
        }
    }
}

pub fn build_assignment(
    employee: &Employee,
    patient: &Patient,
    service: ServiceType,
    score: &CandidateScore,
    preferred_time: Option<&str>,
    now: NaiveDateTime,
) -> Assignment {
    let start_time = resolve_start(preferred_time, now);
    let end_time = start_time + Duration::minutes(i64::from(score.duration_minutes));

    Assignment {
        id: Uuid::new_v4(),
        employee_id: employee.id.clone(),
        employee_name: employee.name.clone(),
        patient_id: patient.id.clone(),
        patient_name: patient.name.clone(),
        service_type: service,
        start_time,
        end_time,
        travel_minutes: score.travel_minutes,
        duration_minutes: score.duration_minutes,
        priority_score: score.priority_score,
        justification: score.justification.clone(),
    }
}
