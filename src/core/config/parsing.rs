use std::env;

use super::types::{ConfigError, Environment};

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn parse_u32(field: &'static str, value: String) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_f64(field: &'static str, value: String) -> Result<f64, ConfigError> {
    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TimePenaltyKind {
    PerMinute,
    Disabled,
}

pub(super) fn parse_time_penalty_kind(
    value: Option<String>,
) -> Result<TimePenaltyKind, ConfigError> {
    match value.as_deref().map(|item| item.to_ascii_lowercase()) {
        None => Ok(TimePenaltyKind::PerMinute),
        Some(ref val) if val == "per_minute" || val == "per-minute" => {
            Ok(TimePenaltyKind::PerMinute)
        }
        Some(ref val) if val == "none" || val == "off" || val == "disabled" => {
            Ok(TimePenaltyKind::Disabled)
        }
        Some(other) => Err(ConfigError::UnknownTimePenalty(other)),
    }
}
