use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::service::{ServiceType, Urgency};

/// Output of the candidate scorer, consumed immediately by the assignment builder.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub employee_id: String,
    pub priority_score: f64,
    pub travel_minutes: u32,
    pub justification: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: Uuid,
    pub employee_id: String,
    pub employee_name: String,
    pub patient_id: String,
    pub patient_name: String,
    pub service_type: ServiceType,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub travel_minutes: u32,
    pub duration_minutes: u32,
    pub priority_score: f64,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub patient_id: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSchedule {
    pub employee_id: String,
    pub employee_name: String,
    pub assignments: Vec<Assignment>,
    pub total_working_hours: f64,
    pub total_travel_minutes: u32,
    pub workload_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleSummary {
    pub total_assignments: usize,
    pub employees_involved: usize,
    pub average_assignments_per_employee: f64,
}
