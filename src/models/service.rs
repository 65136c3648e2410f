use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Medicine,
    Exercise,
    Companionship,
    PersonalCare,
}

impl ServiceType {
    /// Lenient label mapping used for free-text requests. Unknown labels map to
    /// `Medicine`, the most restrictive service.
    pub fn from_label(label: &str) -> Self {
        Self::match_keyword(label).unwrap_or(ServiceType::Medicine)
    }

    /// Substring match without a default, applied to one support-list entry at a time.
    pub fn match_keyword(text: &str) -> Option<Self> {
        let lowered = text.trim().to_lowercase();
        if lowered.contains("medic") {
            Some(ServiceType::Medicine)
        } else if lowered.contains("exercise") {
            Some(ServiceType::Exercise)
        } else if lowered.contains("compan") {
            Some(ServiceType::Companionship)
        } else if lowered.contains("personal") || lowered.contains("care") {
            Some(ServiceType::PersonalCare)
        } else {
            None
        }
    }

    /// Whole-word match for a single prompt token. Prose is full of words that merely
    /// contain a keyword ("carer", "scared"), so nothing here matches by substring.
    pub fn from_prompt_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "medicine" | "medication" | "medications" | "medical" => Some(ServiceType::Medicine),
            "exercise" | "exercises" => Some(ServiceType::Exercise),
            "companionship" | "companion" => Some(ServiceType::Companionship),
            "personal" | "care" | "personal_care" => Some(ServiceType::PersonalCare),
            _ => None,
        }
    }

    pub fn requires_nurse(self) -> bool {
        self == ServiceType::Medicine
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Medicine => "medicine",
            ServiceType::Exercise => "exercise",
            ServiceType::Companionship => "companionship",
            ServiceType::PersonalCare => "personal_care",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered so that `Nurse > SeniorCarer > Carer`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum Qualification {
    #[default]
    Carer,
    SeniorCarer,
    Nurse,
}

impl Qualification {
    pub fn label(self) -> &'static str {
        match self {
            Qualification::Carer => "Carer",
            Qualification::SeniorCarer => "Senior Carer",
            Qualification::Nurse => "Nurse",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Car,
    Bicycle,
    #[default]
    Walking,
    PublicTransit,
    None,
}

impl TransportMode {
    pub fn label(self) -> &'static str {
        match self {
            TransportMode::Car => "Car",
            TransportMode::Bicycle => "Bicycle",
            TransportMode::Walking => "Walking",
            TransportMode::PublicTransit => "Public Transport",
            TransportMode::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" => Urgency::Low,
            "high" | "urgent" => Urgency::High,
            _ => Urgency::Medium,
        }
    }
}
