use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::oracle::{
    OracleError, OracleProposal, OracleRequest, ReasoningOracle, RequestIntent,
    extract_json_object,
};

pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

const SELECTION_INSTRUCTIONS: &str = "You select one care employee for a patient visit. \
Candidates are pre-filtered for hard eligibility and listed in rank order. \
Weigh, in strict priority: qualification (Nurse > Senior Carer > Carer), travel time \
(lower is better, identical locations mean no travel), language match with the patient, \
then workload balance (more remaining capacity is better). \
Reply with a JSON object only: {\"employee_id\": string, \"justification\": string, \
\"priority_score\": number 1-10, \"estimated_travel_time\": minutes, \
\"estimated_duration\": minutes}.";

const INTERPRET_INSTRUCTIONS: &str = "Extract a care visit request from the user's message. \
Reply with a JSON object only: {\"patient_id\": string|null, \"service_type\": \
\"medicine\"|\"exercise\"|\"companionship\"|\"personal_care\"|null, \
\"preferred_time\": \"HH:MM\"|null, \"urgency\": \"low\"|\"medium\"|\"high\"|null}.";

pub struct ChatOracleParams {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// OpenAI-compatible chat-completions oracle.
pub struct ChatCompletionOracle {
    params: ChatOracleParams,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionOracle {
    pub fn new(params: ChatOracleParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, OracleError> {
        let mut url = self.params.base_url.trim_end_matches('/').to_string();
        url.push_str(CHAT_COMPLETIONS_PATH);

        let messages = [
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ];

        let response: ChatResponse = self
            .client
            .post(url)
            .bearer_auth(&self.params.api_key)
            .json(&json!({
                "model": self.params.model,
                "messages": messages,
                "temperature": temperature,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}

#[async_trait]
impl ReasoningOracle for ChatCompletionOracle {
    async fn propose(&self, request: &OracleRequest) -> Result<OracleProposal, OracleError> {
        let payload = serde_json::to_string_pretty(request)?;
        let content = self.complete(SELECTION_INSTRUCTIONS, &payload, 0.2).await?;
        Ok(serde_json::from_str(extract_json_object(&content)?)?)
    }

    async fn interpret(&self, prompt: &str) -> Result<RequestIntent, OracleError> {
        let content = self.complete(INTERPRET_INSTRUCTIONS, prompt, 0.1).await?;
        Ok(serde_json::from_str(extract_json_object(&content)?)?)
    }
}
