use crate::engine::workload::WorkloadTracker;
use crate::models::assignment::Assignment;
use crate::models::employee::Employee;
use crate::models::patient::Patient;
use crate::models::service::Qualification;

/// Post-hoc audit of an existing assignment. Returns human-readable violations; an
/// empty list means the assignment is clean.
pub fn validate_assignment(
    assignment: &Assignment,
    employee: Option<&Employee>,
    patient: Option<&Patient>,
    workload: &WorkloadTracker,
) -> Vec<String> {
    let (Some(employee), Some(patient)) = (employee, patient) else {
        return vec!["Employee or patient not found".to_string()];
    };

    let mut violations = Vec::new();

    if assignment.service_type.requires_nurse() && employee.qualification != Qualification::Nurse {
        violations.push("Medicine services require a qualified nurse".to_string());
    }

    if !patient.prefers_default_language() && !employee.speaks(&patient.preferred_language) {
        violations.push(format!(
            "Employee doesn't speak patient's preferred language ({})",
            patient.preferred_language
        ));
    }

    if workload.current(&employee.id) > employee.daily_capacity {
        violations.push("Employee workload exceeds maximum daily capacity".to_string());
    }

    if assignment.end_time < assignment.start_time {
        violations.push("Assignment ends before it starts".to_string());
    }

    violations
}
