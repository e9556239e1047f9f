use super::parsing::{
    env_optional, parse_bool, parse_environment, parse_f64, parse_time_penalty_kind, parse_u32,
    TimePenaltyKind,
};
use super::types::{
    ConfigError, RuntimeSettings, ScoringSettings, Settings, TelemetrySettings,
};
use crate::services::scoring_policy::{
    ScoringPolicy, TimePenaltyMode, DEFAULT_TIME_PENALTY_CAP, DEFAULT_TIME_PENALTY_PER_MINUTE,
    TASK1_TIME_LIMIT_MINUTES, TASK2_TIME_LIMIT_MINUTES,
};

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(env_optional)
    }

    /// Builds settings from any key lookup; empty values must already be filtered out.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let environment = parse_environment(lookup("IELTS_ENV").or_else(|| lookup("ENVIRONMENT")));

        let log_level = or_default("IELTS_LOG_LEVEL", "info");
        let json = lookup("IELTS_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or_else(|| environment.is_production());

        let time_penalty = match parse_time_penalty_kind(lookup("IELTS_TIME_PENALTY"))? {
            TimePenaltyKind::Disabled => TimePenaltyMode::Disabled,
            TimePenaltyKind::PerMinute => TimePenaltyMode::PerMinute {
                points_per_minute: parse_f64(
                    "IELTS_TIME_PENALTY_PER_MINUTE",
                    or_default(
                        "IELTS_TIME_PENALTY_PER_MINUTE",
                        &DEFAULT_TIME_PENALTY_PER_MINUTE.to_string(),
                    ),
                )?,
                cap: parse_f64(
                    "IELTS_TIME_PENALTY_CAP",
                    or_default("IELTS_TIME_PENALTY_CAP", &DEFAULT_TIME_PENALTY_CAP.to_string()),
                )?,
            },
        };

        let task1_time_limit_minutes = parse_u32(
            "IELTS_TASK1_TIME_LIMIT_MINUTES",
            or_default("IELTS_TASK1_TIME_LIMIT_MINUTES", &TASK1_TIME_LIMIT_MINUTES.to_string()),
        )?;
        let task2_time_limit_minutes = parse_u32(
            "IELTS_TASK2_TIME_LIMIT_MINUTES",
            or_default("IELTS_TASK2_TIME_LIMIT_MINUTES", &TASK2_TIME_LIMIT_MINUTES.to_string()),
        )?;

        let settings = Self {
            runtime: RuntimeSettings { environment },
            scoring: ScoringSettings {
                time_penalty,
                task1_time_limit_minutes,
                task2_time_limit_minutes,
            },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub fn scoring(&self) -> &ScoringSettings {
        &self.scoring
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn scoring_policy(&self) -> ScoringPolicy {
        ScoringPolicy::default()
            .with_time_limits(
                self.scoring.task1_time_limit_minutes,
                self.scoring.task2_time_limit_minutes,
            )
            .with_time_penalty(self.scoring.time_penalty.into_rule())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scoring.task1_time_limit_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "IELTS_TASK1_TIME_LIMIT_MINUTES",
                value: String::from("0"),
            });
        }
        if self.scoring.task2_time_limit_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "IELTS_TASK2_TIME_LIMIT_MINUTES",
                value: String::from("0"),
            });
        }

        if let TimePenaltyMode::PerMinute { points_per_minute, cap } = self.scoring.time_penalty {
            if points_per_minute < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "IELTS_TIME_PENALTY_PER_MINUTE",
                    value: points_per_minute.to_string(),
                });
            }
            if cap < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "IELTS_TIME_PENALTY_CAP",
                    value: cap.to_string(),
                });
            }
        }

        Ok(())
    }
}
