//! Session configuration.
//!
//! Defaults carry the calibrated constants of the interview UI. Every value
//! can be overridden from `CPILOT_*` environment variables, and
//! `validate()` rejects settings that would silently disable sampling.

use std::str::FromStr;
use std::time::Duration;

use cpilot_vision::{AttentionConfig, DetectorConfig, OverrideThresholds};

use crate::error::{SessionError, SessionResult};

/// Confidence estimator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceConfig {
    /// Score at session start
    pub initial: i32,
    /// Lowest reachable score
    pub floor: i32,
    /// Highest reachable score
    pub ceiling: i32,
    /// Applied on `Nervous` and `Sad`
    pub decrease_step: i32,
    /// Applied on `Happy` and `Neutral`
    pub increase_step: i32,
    /// Magnitude of the ambient random walk
    pub jitter_step: i32,
    /// Cadence of the ambient random walk
    pub jitter_interval: Duration,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            initial: 75,
            floor: 30,
            ceiling: 95,
            decrease_step: 3,
            increase_step: 2,
            jitter_step: 2,
            jitter_interval: Duration::from_millis(3000),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Detection tick cadence
    pub sample_interval: Duration,
    /// Maximum events kept in the history log
    pub history_capacity: usize,
    /// Buffered updates per subscriber before a slow consumer starts lagging
    pub update_buffer: usize,
    /// How long `stop` waits for session tasks before aborting them
    pub shutdown_timeout: Duration,
    pub detector: DetectorConfig,
    pub attention: AttentionConfig,
    pub overrides: OverrideThresholds,
    pub confidence: ConfidenceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(1000),
            history_capacity: 20,
            update_buffer: 64,
            shutdown_timeout: Duration::from_secs(10),
            detector: DetectorConfig::default(),
            attention: AttentionConfig::default(),
            overrides: OverrideThresholds::default(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis_or(key: &str, default: Duration) -> Duration {
    Duration::from_millis(env_or(key, default.as_millis() as u64))
}

impl SessionConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults. The result
    /// is not validated; call [`SessionConfig::validate`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let confidence = defaults.confidence;

        Self {
            sample_interval: env_millis_or("CPILOT_SAMPLE_INTERVAL_MS", defaults.sample_interval),
            history_capacity: env_or("CPILOT_HISTORY_CAPACITY", defaults.history_capacity),
            update_buffer: env_or("CPILOT_UPDATE_BUFFER", defaults.update_buffer),
            shutdown_timeout: env_millis_or("CPILOT_SHUTDOWN_TIMEOUT_MS", defaults.shutdown_timeout),
            detector: DetectorConfig {
                min_detection_score: env_or(
                    "CPILOT_MIN_DETECTION_SCORE",
                    defaults.detector.min_detection_score,
                ),
                timeout: env_millis_or("CPILOT_DETECTOR_TIMEOUT_MS", defaults.detector.timeout),
            },
            attention: AttentionConfig {
                tilt_threshold: env_or("CPILOT_TILT_THRESHOLD", defaults.attention.tilt_threshold),
            },
            overrides: OverrideThresholds {
                fearful: env_or("CPILOT_OVERRIDE_FEARFUL", defaults.overrides.fearful),
                surprised: env_or("CPILOT_OVERRIDE_SURPRISED", defaults.overrides.surprised),
                sad: env_or("CPILOT_OVERRIDE_SAD", defaults.overrides.sad),
            },
            confidence: ConfidenceConfig {
                initial: env_or("CPILOT_CONFIDENCE_INITIAL", confidence.initial),
                floor: env_or("CPILOT_CONFIDENCE_FLOOR", confidence.floor),
                ceiling: env_or("CPILOT_CONFIDENCE_CEILING", confidence.ceiling),
                decrease_step: env_or("CPILOT_CONFIDENCE_DECREASE_STEP", confidence.decrease_step),
                increase_step: env_or("CPILOT_CONFIDENCE_INCREASE_STEP", confidence.increase_step),
                jitter_step: env_or("CPILOT_CONFIDENCE_JITTER_STEP", confidence.jitter_step),
                jitter_interval: env_millis_or(
                    "CPILOT_CONFIDENCE_JITTER_INTERVAL_MS",
                    confidence.jitter_interval,
                ),
            },
        }
    }

    /// Reject configurations that cannot run a session.
    pub fn validate(&self) -> SessionResult<()> {
        if self.sample_interval.is_zero() {
            return Err(SessionError::config_error("sample_interval must be positive"));
        }
        if self.history_capacity == 0 {
            return Err(SessionError::config_error("history_capacity must be positive"));
        }
        if self.update_buffer == 0 {
            return Err(SessionError::config_error("update_buffer must be positive"));
        }
        if self.detector.timeout.is_zero() {
            return Err(SessionError::config_error("detector timeout must be positive"));
        }
        if !(0.0..=1.0).contains(&self.detector.min_detection_score) {
            return Err(SessionError::config_error(
                "min_detection_score must be within [0, 1]",
            ));
        }
        if !self.attention.tilt_threshold.is_finite() || self.attention.tilt_threshold < 0.0 {
            return Err(SessionError::config_error(
                "tilt_threshold must be a non-negative number",
            ));
        }
        for (name, value) in [
            ("fearful", self.overrides.fearful),
            ("surprised", self.overrides.surprised),
            ("sad", self.overrides.sad),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SessionError::config_error(format!(
                    "{name} override threshold must be within [0, 1]"
                )));
            }
        }
        self.confidence.validate()
    }
}

impl ConfidenceConfig {
    pub fn validate(&self) -> SessionResult<()> {
        if self.floor > self.ceiling {
            return Err(SessionError::config_error(format!(
                "confidence floor {} exceeds ceiling {}",
                self.floor, self.ceiling
            )));
        }
        if !(self.floor..=self.ceiling).contains(&self.initial) {
            return Err(SessionError::config_error(format!(
                "initial confidence {} outside [{}, {}]",
                self.initial, self.floor, self.ceiling
            )));
        }
        if self.decrease_step < 0 || self.increase_step < 0 || self.jitter_step < 0 {
            return Err(SessionError::config_error("confidence steps must be non-negative"));
        }
        if self.jitter_interval.is_zero() {
            return Err(SessionError::config_error("jitter_interval must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_interval, Duration::from_millis(1000));
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.confidence.jitter_interval, Duration::from_millis(3000));
        assert_eq!(config.attention.tilt_threshold, 0.2);
    }

    #[test]
    fn test_zero_capacity_is_fatal() {
        let config = SessionConfig {
            history_capacity: 0,
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let config = SessionConfig {
            sample_interval: Duration::ZERO,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.confidence.jitter_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_confidence_bounds_are_checked() {
        let mut config = SessionConfig::default();
        config.confidence.floor = 96;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.confidence.initial = 10;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.confidence.decrease_step = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_thresholds_are_checked() {
        let mut config = SessionConfig::default();
        config.overrides.surprised = 1.5;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.attention.tilt_threshold = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SessionConfig::default();
        config.detector.min_detection_score = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("CPILOT_TEST_ENV_OR_GARBAGE", "not-a-number");
        assert_eq!(env_or("CPILOT_TEST_ENV_OR_GARBAGE", 7usize), 7);
        std::env::set_var("CPILOT_TEST_ENV_OR_GARBAGE", " 12 ");
        assert_eq!(env_or("CPILOT_TEST_ENV_OR_GARBAGE", 7usize), 12);
        std::env::remove_var("CPILOT_TEST_ENV_OR_GARBAGE");
    }
}
