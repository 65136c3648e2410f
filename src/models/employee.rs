use serde::{Deserialize, Serialize};

use crate::models::service::{Qualification, TransportMode};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub qualification: Qualification,
    pub languages: Vec<String>,
    pub transport: TransportMode,
    pub home_location: String,
    pub post_code: String,
    pub daily_capacity: u32,
}

impl Employee {
    /// Case-insensitive membership over the parsed language list.
    pub fn speaks(&self, language: &str) -> bool {
        let wanted = language.trim().to_lowercase();
        self.languages
            .iter()
            .any(|spoken| spoken.trim().to_lowercase() == wanted)
    }
}

/// An employee together with the live workload count held by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeWorkload {
    #[serde(flatten)]
    pub employee: Employee,
    pub current_assignments: u32,
}
