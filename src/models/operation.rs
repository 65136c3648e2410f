use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    pub kind: String,
    pub description: String,
    pub details: Value,
    pub recorded_at: DateTime<Utc>,
}
