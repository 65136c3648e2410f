use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub oracle: Option<OracleConfig>,
    pub routing: Option<RoutingConfig>,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Knobs the assignment engine needs regardless of which collaborators are wired in.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub oracle_timeout: Duration,
    pub routing_timeout: Duration,
    pub default_daily_capacity: u32,
    pub default_travel_minutes: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            oracle_timeout: Duration::from_millis(10_000),
            routing_timeout: Duration::from_millis(3_000),
            default_daily_capacity: 8,
            default_travel_minutes: 15,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let oracle = first_var(&["ORACLE_API_KEY", "OPENAI_API_KEY"]).map(|api_key| OracleConfig {
            api_key,
            base_url: env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("ORACLE_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
        });

        let routing =
            first_var(&["ROUTING_API_KEY", "GOOGLE_MAPS_API_KEY"]).map(|api_key| RoutingConfig {
                api_key,
                base_url: env::var("ROUTING_BASE_URL")
                    .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api".to_string()),
            });

        let default_daily_capacity: u32 = parse_or_default("DEFAULT_DAILY_CAPACITY", 8)?;
        if default_daily_capacity == 0 {
            return Err(AppError::Internal(
                "invalid DEFAULT_DAILY_CAPACITY: must be >= 1".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            oracle,
            routing,
            engine: EngineSettings {
                oracle_timeout: Duration::from_millis(parse_or_default("ORACLE_TIMEOUT_MS", 10_000)?),
                routing_timeout: Duration::from_millis(parse_or_default("ROUTING_TIMEOUT_MS", 3_000)?),
                default_daily_capacity,
                default_travel_minutes: parse_or_default("DEFAULT_TRAVEL_MINUTES", 15)?,
            },
        })
    }
}

fn first_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
