pub mod chat;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::service::{ServiceType, Urgency};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("oracle returned no content")]
    EmptyResponse,

    #[error("oracle response is malformed: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for OracleError {
    fn from(err: serde_json::Error) -> Self {
        OracleError::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientBrief {
    pub id: String,
    pub name: String,
    pub location: String,
    pub preferred_language: String,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub qualification: &'static str,
    pub languages: Vec<String>,
    pub speaks_preferred_language: bool,
    pub transport: &'static str,
    pub location: String,
    pub current_assignments: u32,
    pub daily_capacity: u32,
    pub travel_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest {
    pub patient: PatientBrief,
    pub service_type: ServiceType,
    pub urgency: Urgency,
    pub preferred_time: Option<String>,
    pub candidates: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OracleProposal {
    pub employee_id: String,
    #[serde(alias = "reasoning", default)]
    pub justification: String,
    pub priority_score: f64,
    #[serde(alias = "estimated_travel_time")]
    pub travel_minutes: u32,
    #[serde(alias = "estimated_duration")]
    pub duration_minutes: u32,
}

/// Structured intent extracted from a free-text request.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RequestIntent {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    async fn propose(&self, request: &OracleRequest) -> Result<OracleProposal, OracleError>;

    async fn interpret(&self, prompt: &str) -> Result<RequestIntent, OracleError>;
}

/// Models frequently wrap JSON in prose or code fences; keep the outermost object.
pub fn extract_json_object(content: &str) -> Result<&str, OracleError> {
    let start = content.find('{');
    let end = content.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&content[start..=end]),
        _ => Err(OracleError::Malformed("no JSON object in reply".to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::{OracleProposal, extract_json_object};

    #[test]
    fn fenced_reply_parses_with_source_aliases() {
        let reply = "Here you go:\n```json\n{\"employee_id\": \"E2\", \"reasoning\": \"speaks Urdu\", \
                     \"priority_score\": 8.5, \"estimated_travel_time\": 12, \"estimated_duration\": 45}\n```";

        let json = extract_json_object(reply).unwrap();
        let proposal: OracleProposal = serde_json::from_str(json).unwrap();

        assert_eq!(proposal.employee_id, "E2");
        assert_eq!(proposal.justification, "speaks Urdu");
        assert_eq!(proposal.travel_minutes, 12);
        assert_eq!(proposal.duration_minutes, 45);
    }

    #[test]
    fn reply_without_object_is_malformed() {
        assert!(extract_json_object("I cannot decide").is_err());
    }
}
