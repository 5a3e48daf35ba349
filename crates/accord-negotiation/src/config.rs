//! Negotiation configuration

use std::str::FromStr;
use std::time::Duration;

use crate::convergence::DEFAULT_TOLERANCE;
use crate::error::{NegotiationError, Result};

pub const DEFAULT_MAX_ROUNDS: u32 = 5;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Limits and generation settings for one negotiation
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationConfig {
    /// Full A/B rounds before finalizing without convergence
    pub max_rounds: u32,
    /// Allowed difference on each numeric field
    pub tolerance: u64,
    /// Limit on a single generation call
    pub call_timeout: Option<Duration>,
    /// Limit on the whole negotiation
    pub deadline: Option<Duration>,
    pub temperature: f32,
    /// Model override passed to the provider
    pub model: Option<String>,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            tolerance: DEFAULT_TOLERANCE,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            deadline: None,
            temperature: DEFAULT_TEMPERATURE,
            model: None,
        }
    }
}

impl NegotiationConfig {
    /// Defaults overridden by `ACCORD_*` environment variables (and `.env`).
    ///
    /// - `ACCORD_MAX_ROUNDS`
    /// - `ACCORD_TOLERANCE`
    /// - `ACCORD_CALL_TIMEOUT_SECS` (`0` disables)
    /// - `ACCORD_DEADLINE_SECS` (`0` disables)
    /// - `ACCORD_TEMPERATURE`
    /// - `ACCORD_MODEL`
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Some(max_rounds) = env_parse("ACCORD_MAX_ROUNDS")? {
            config.max_rounds = max_rounds;
        }
        if let Some(tolerance) = env_parse("ACCORD_TOLERANCE")? {
            config.tolerance = tolerance;
        }
        if let Some(secs) = env_parse::<u64>("ACCORD_CALL_TIMEOUT_SECS")? {
            config.call_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("ACCORD_DEADLINE_SECS")? {
            config.deadline = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(temperature) = env_parse("ACCORD_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Ok(model) = std::env::var("ACCORD_MODEL") {
            if !model.trim().is_empty() {
                config.model = Some(model);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_tolerance(mut self, tolerance: u64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rounds == 0 {
            return Err(NegotiationError::config(
                "max_rounds must be at least 1: a settlement needs one full round",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(NegotiationError::config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| NegotiationError::config(format!("{}={:?}: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NegotiationConfig::default();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.tolerance, 5);
        assert_eq!(config.call_timeout, Some(Duration::from_secs(60)));
        assert!(config.deadline.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let config = NegotiationConfig::default().with_max_rounds(0);
        assert!(matches!(
            config.validate(),
            Err(NegotiationError::Config { .. })
        ));
    }

    #[test]
    fn test_temperature_range() {
        let config = NegotiationConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_parse_reports_key() {
        std::env::set_var("ACCORD_TEST_ROUNDS_BAD", "many");
        let err = env_parse::<u32>("ACCORD_TEST_ROUNDS_BAD").unwrap_err();
        assert!(err.to_string().contains("ACCORD_TEST_ROUNDS_BAD"));
        std::env::remove_var("ACCORD_TEST_ROUNDS_BAD");
        assert_eq!(env_parse::<u32>("ACCORD_TEST_ROUNDS_BAD").unwrap(), None);
    }

    #[test]
    fn test_zero_seconds_disable_limits() {
        std::env::set_var("ACCORD_CALL_TIMEOUT_SECS", "0");
        std::env::set_var("ACCORD_DEADLINE_SECS", "0");
        let disabled = NegotiationConfig::from_env();

        std::env::set_var("ACCORD_CALL_TIMEOUT_SECS", "15");
        std::env::set_var("ACCORD_DEADLINE_SECS", "90");
        let enabled = NegotiationConfig::from_env();

        std::env::remove_var("ACCORD_CALL_TIMEOUT_SECS");
        std::env::remove_var("ACCORD_DEADLINE_SECS");

        let disabled = disabled.unwrap();
        assert_eq!(disabled.call_timeout, None);
        assert_eq!(disabled.deadline, None);

        let enabled = enabled.unwrap();
        assert_eq!(enabled.call_timeout, Some(Duration::from_secs(15)));
        assert_eq!(enabled.deadline, Some(Duration::from_secs(90)));
    }
}
