//! Engine tuning configuration
//!
//! Tick-rate bounds and step heuristics used to pick an adaptive update
//! interval per animation. Presets cover the common cases; hosts can also
//! load the values from a TOML file:
//!
//! ```toml
//! default_interval_ms = 16
//! min_interval_ms = 1
//! max_interval_ms = 16
//! float_step = 0.5
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning constants shared by every animation of a scheduler
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interval for shapes without a step heuristic (ms)
    pub default_interval_ms: u32,
    /// Fastest allowed tick interval (ms)
    pub min_interval_ms: u32,
    /// Slowest allowed tick interval (ms)
    pub max_interval_ms: u32,
    /// Smallest float change worth a separate update
    pub float_step: f64,
    /// Upper bound on a single sleep of the blocking run loop (ms)
    pub max_idle_sleep_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl EngineConfig {
    /// Roughly 60 updates per second at most.
    pub fn standard() -> Self {
        Self {
            default_interval_ms: 16, // ~60fps
            min_interval_ms: 1,
            max_interval_ms: 16,
            float_step: 0.5,
            max_idle_sleep_ms: 100,
        }
    }

    /// High refresh rate displays.
    pub fn smooth() -> Self {
        Self {
            default_interval_ms: 8, // ~120fps
            min_interval_ms: 1,
            max_interval_ms: 8,
            float_step: 0.25,
            max_idle_sleep_ms: 50,
        }
    }

    /// Fewer wakeups at the cost of smoothness.
    pub fn low_power() -> Self {
        Self {
            default_interval_ms: 33, // ~30fps
            min_interval_ms: 4,
            max_interval_ms: 33,
            float_step: 1.0,
            max_idle_sleep_ms: 250,
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval_ms == 0 || self.default_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick intervals must be at least 1ms".to_string(),
            ));
        }
        if self.min_interval_ms > self.max_interval_ms {
            return Err(ConfigError::Invalid(format!(
                "min_interval_ms ({}) exceeds max_interval_ms ({})",
                self.min_interval_ms, self.max_interval_ms
            )));
        }
        if self.float_step.is_nan() || self.float_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "float_step must be positive, got {}",
                self.float_step
            )));
        }
        Ok(())
    }

    /// Set the interval bounds.
    pub fn with_interval_bounds(mut self, min_ms: u32, max_ms: u32) -> Self {
        self.min_interval_ms = min_ms;
        self.max_interval_ms = max_ms;
        self
    }

    /// Set the default interval.
    pub fn with_default_interval(mut self, interval_ms: u32) -> Self {
        self.default_interval_ms = interval_ms;
        self
    }

    /// Set the float step heuristic.
    pub fn with_float_step(mut self, step: f64) -> Self {
        self.float_step = step;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::standard().validate().is_ok());
        assert!(EngineConfig::smooth().validate().is_ok());
        assert!(EngineConfig::low_power().validate().is_ok());
        assert_eq!(EngineConfig::default(), EngineConfig::standard());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("max_interval_ms = 32\nfloat_step = 2.0\n").unwrap();
        assert_eq!(config.max_interval_ms, 32);
        assert_eq!(config.float_step, 2.0);
        assert_eq!(config.min_interval_ms, 1);
        assert_eq!(config.default_interval_ms, 16);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("min_interval_ms = 20\nmax_interval_ms = 10\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("float_step = 0.0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("float_step = \"fast\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/kinetic.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_builder_roundtrip_through_toml() {
        let config = EngineConfig::standard()
            .with_interval_bounds(2, 24)
            .with_default_interval(12)
            .with_float_step(0.1);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
