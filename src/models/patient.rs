use serde::{Deserialize, Serialize};

use crate::models::service::ServiceType;

pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub required_services: Vec<ServiceType>,
    pub preferred_language: String,
    pub home_location: String,
    pub post_code: String,
    pub priority: i32,
}

impl Patient {
    pub fn primary_service(&self) -> Option<ServiceType> {
        self.required_services.first().copied()
    }

    /// A default-language preference is satisfied by every employee.
    pub fn prefers_default_language(&self) -> bool {
        let preference = self.preferred_language.trim();
        preference.is_empty() || preference.eq_ignore_ascii_case(DEFAULT_LANGUAGE)
    }
}
