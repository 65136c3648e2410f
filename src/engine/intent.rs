use crate::models::assignment::ServiceRequest;
use crate::models::service::{ServiceType, Urgency};
use crate::oracle::RequestIntent;

/// Turns an extracted intent into a concrete request. `None` when no patient could be
/// identified.
pub fn to_service_request(intent: RequestIntent) -> Option<ServiceRequest> {
    let patient_id = intent
        .patient_id
        .map(|id| id.trim().to_uppercase())
        .filter(|id| !id.is_empty())?;

    Some(ServiceRequest {
        patient_id,
        service_type: intent
            .service_type
            .as_deref()
            .map(ServiceType::from_label)
            .unwrap_or(ServiceType::Medicine),
        preferred_time: intent.preferred_time.filter(|time| !time.trim().is_empty()),
        urgency: intent
            .urgency
            .as_deref()
            .map(Urgency::from_label)
            .unwrap_or_default(),
    })
}

/// Local interpretation used when the oracle cannot be reached: the first token shaped
/// like a patient id, the first whole-word service keyword, medium urgency.
pub fn interpret_locally(prompt: &str) -> RequestIntent {
    let tokens: Vec<String> = prompt
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_uppercase()
        })
        .filter(|token| !token.is_empty())
        .collect();

    let patient_id = tokens
        .iter()
        .find(|token| {
            token.len() <= 5
                && token.starts_with('P')
                && token[1..].chars().any(|c| c.is_ascii_digit())
        })
        .cloned();

    let service_type = tokens
        .iter()
        .find_map(|token| ServiceType::from_prompt_word(token))
        .map(|service| service.as_str().to_string());

    RequestIntent {
        patient_id,
        service_type,
        preferred_time: None,
        urgency: None,
    }
}
