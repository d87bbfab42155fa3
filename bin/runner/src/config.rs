//! Centralized runner configuration.
//!
//! This module provides strongly-typed configuration for the runner,
//! loaded via the `config` crate from environment variables
//! (`API__BASE_URL`, `API__BEARER_TOKEN`, `VARIANT`, `STEP_TIMEOUT_SECONDS`).

use serde::Deserialize;
use std::time::Duration;

/// Runner configuration.
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    /// Automation API connection settings.
    pub api: ApiConfig,

    /// Run-scoped traceability tag attached to every outbound call.
    #[serde(default = "default_variant")]
    pub variant: String,

    /// Per-step deadline in seconds. Zero disables the deadline, restoring
    /// the wait-forever behavior of the console UI.
    #[serde(default = "default_step_timeout_seconds")]
    pub step_timeout_seconds: u64,
}

/// Automation API connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the controller's Automation API.
    pub base_url: String,

    /// Bearer credential attached to every request, if any.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

fn default_variant() -> String {
    "default".to_string()
}

fn default_step_timeout_seconds() -> u64 {
    120
}

impl RunnerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the per-step deadline, or `None` when disabled.
    #[must_use]
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_seconds > 0).then(|| Duration::from_secs(self.step_timeout_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> RunnerConfig {
        config::Config::builder()
            .set_override("api.base_url", "https://controller.example.net")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn config_has_correct_defaults() {
        let config = minimal_config();
        assert_eq!(config.variant, "default");
        assert_eq!(config.step_timeout_seconds, 120);
        assert!(config.api.bearer_token.is_none());
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let mut config = minimal_config();
        config.step_timeout_seconds = 0;
        assert!(config.step_timeout().is_none());

        config.step_timeout_seconds = 30;
        assert_eq!(config.step_timeout(), Some(Duration::from_secs(30)));
    }
}
