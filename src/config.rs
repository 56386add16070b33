//! Application-level configuration constants and the runtime countdown configuration.

use crate::utils::{parse_duration_ms, validate_range, DurationParseError};
use serde::{Deserialize, Serialize};
use std::fmt;

// Defaults
pub const DEFAULT_REDIRECT_URL: &str = "https://example.com/download";
pub const DEFAULT_COUNTDOWN_MS: u32 = 5_000;
pub const DEFAULT_UPDATE_INTERVAL_MS: u32 = 50;
pub const DEFAULT_CIRCLE_CIRCUMFERENCE: f64 = 283.0;

// Timing
pub const STARTUP_DELAY_MS: u32 = 100;
pub const REDIRECT_FEEDBACK_DELAY_MS: u32 = 300;

// Limits
pub const MIN_COUNTDOWN_MS: u32 = 100;
pub const MAX_COUNTDOWN_MS: u32 = 600_000;

// Display
pub const MIN_VISIBLE_PERCENT: f64 = 5.0;
pub const FADED_OPACITY: f64 = 0.5;
pub const RING_RADIUS: f64 = 45.0;

// Page wiring
pub const TRIGGER_KEY: &str = "Enter";
pub const CONFIG_ELEMENT_ID: &str = "countdown-config";

/// Configuration recognised by the countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownConfig {
    pub redirect_url: String,
    pub countdown_duration_ms: u32,
    /// Informational only, ticks are frame driven.
    pub display_update_interval_ms: u32,
    pub circle_circumference: f64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            countdown_duration_ms: DEFAULT_COUNTDOWN_MS,
            display_update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            circle_circumference: DEFAULT_CIRCLE_CIRCUMFERENCE,
        }
    }
}

/// A duration given either as plain milliseconds or as text such as `"5s"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Millis(u32),
    Text(String),
}

/// Partial configuration read from the page; missing fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub redirect_url: Option<String>,
    #[serde(alias = "countdownDuration")]
    pub countdown_duration_ms: Option<DurationValue>,
    #[serde(alias = "updateInterval")]
    pub display_update_interval_ms: Option<u32>,
    pub circle_circumference: Option<f64>,
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Json(String),
    EmptyRedirectUrl,
    InvalidRedirectUrl(String),
    InvalidDuration(String),
    UnparsableDuration(DurationParseError),
    InvalidCircumference(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "Malformed countdown configuration: {}", msg),
            ConfigError::EmptyRedirectUrl => write!(f, "Redirect URL cannot be empty"),
            ConfigError::InvalidRedirectUrl(url) => write!(
                f,
                "Invalid redirect URL '{}' (expected http(s):// or a root-relative path)",
                url
            ),
            ConfigError::InvalidDuration(msg) => write!(f, "Invalid countdown duration: {}", msg),
            ConfigError::UnparsableDuration(e) => write!(f, "Invalid countdown duration: {}", e),
            ConfigError::InvalidCircumference(c) => {
                write!(f, "Circle circumference must be a positive number, got {}", c)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl CountdownConfig {
    /// Build a configuration from a JSON override document layered over the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let overrides: ConfigOverrides =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        Self::default().with_overrides(overrides)
    }

    /// Apply overrides and validate the result.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(url) = overrides.redirect_url {
            self.redirect_url = url.trim().to_string();
        }
        if let Some(duration) = overrides.countdown_duration_ms {
            self.countdown_duration_ms = match duration {
                DurationValue::Millis(ms) => ms,
                DurationValue::Text(text) => {
                    parse_duration_ms(&text).map_err(ConfigError::UnparsableDuration)?
                }
            };
        }
        if let Some(interval) = overrides.display_update_interval_ms {
            self.display_update_interval_ms = interval;
        }
        if let Some(circumference) = overrides.circle_circumference {
            self.circle_circumference = circumference;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.redirect_url.as_str();
        if url.is_empty() {
            return Err(ConfigError::EmptyRedirectUrl);
        }
        let absolute = url.starts_with("https://") || url.starts_with("http://");
        let root_relative = url.starts_with('/') && !url.starts_with("//");
        if !(absolute || root_relative) || url.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidRedirectUrl(url.to_string()));
        }

        validate_range(
            self.countdown_duration_ms,
            Some(MIN_COUNTDOWN_MS),
            Some(MAX_COUNTDOWN_MS),
            "Countdown duration (ms)",
        )
        .map_err(ConfigError::InvalidDuration)?;

        if !self.circle_circumference.is_finite() || self.circle_circumference <= 0.0 {
            return Err(ConfigError::InvalidCircumference(self.circle_circumference));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CountdownConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.countdown_duration_ms, 5_000);
        assert_eq!(config.circle_circumference, 283.0);
    }

    #[test]
    fn empty_document_keeps_defaults() {
        assert_eq!(CountdownConfig::from_json("{}"), Ok(CountdownConfig::default()));
    }

    #[test]
    fn overrides_accept_numeric_and_text_durations() {
        let config = CountdownConfig::from_json(
            r#"{"redirectUrl": "https://example.org/get", "countdownDurationMs": 8000}"#,
        )
        .unwrap();
        assert_eq!(config.redirect_url, "https://example.org/get");
        assert_eq!(config.countdown_duration_ms, 8_000);

        let config = CountdownConfig::from_json(r#"{"countdownDuration": "1:30"}"#).unwrap();
        assert_eq!(config.countdown_duration_ms, 90_000);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            CountdownConfig::from_json(r#"{"redirectUrl": ""}"#),
            Err(ConfigError::EmptyRedirectUrl)
        ));
        assert!(matches!(
            CountdownConfig::from_json(r#"{"redirectUrl": "javascript:alert(1)"}"#),
            Err(ConfigError::InvalidRedirectUrl(_))
        ));
        assert!(matches!(
            CountdownConfig::from_json(r#"{"countdownDurationMs": 0}"#),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(matches!(
            CountdownConfig::from_json(r#"{"countdownDuration": "soon"}"#),
            Err(ConfigError::UnparsableDuration(DurationParseError::UnknownFormat(_)))
        ));
        assert!(matches!(
            CountdownConfig::from_json(r#"{"circleCircumference": -1.0}"#),
            Err(ConfigError::InvalidCircumference(_))
        ));
        assert!(matches!(
            CountdownConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn root_relative_urls_are_allowed() {
        let config = CountdownConfig::from_json(r#"{"redirectUrl": "/files/setup.exe"}"#).unwrap();
        assert_eq!(config.redirect_url, "/files/setup.exe");
        assert!(CountdownConfig::from_json(r#"{"redirectUrl": "//evil.example"}"#).is_err());
    }
}
