// Simulation configuration: defaults, TOML round-trip and validation

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    Simulate,
    Replay,
}

impl SimulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMode::Simulate => "simulate",
            SimulationMode::Replay => "replay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub instrument: String,
    pub initial_price: f64,
    pub spread: f64,
    /// Standard deviation of the per-tick Gaussian mid-price step
    pub volatility: f64,
    /// Optional real-time pacing per event; never affects determinism
    pub latency_ms: u64,
    pub iterations: usize,
    pub seed: u32,
    pub event_log_path: Option<PathBuf>,
    pub replay_log_path: Option<PathBuf>,
    pub mode: SimulationMode,
    pub quiet: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            instrument: "XYZ".to_string(),
            initial_price: 100.0,
            spread: 0.1,
            volatility: 0.5,
            latency_ms: 10,
            iterations: 1000,
            seed: 42,
            event_log_path: None,
            replay_log_path: None,
            mode: SimulationMode::Simulate,
            quiet: false,
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::FileRead(format!("{}: {}", path.as_ref().display(), e)))?;

        let config: SimulationConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(&path, content)
            .map_err(|e| ConfigError::FileWrite(format!("{}: {}", path.as_ref().display(), e)))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instrument.is_empty() {
            return Err(ConfigError::Validation("instrument must not be empty".to_string()));
        }

        if self.iterations == 0 {
            return Err(ConfigError::Validation("iterations must be greater than 0".to_string()));
        }

        if self.initial_price <= 0.0 {
            return Err(ConfigError::Validation("initial_price must be positive".to_string()));
        }

        if self.spread <= 0.0 {
            return Err(ConfigError::Validation("spread must be positive".to_string()));
        }

        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(ConfigError::Validation(
                "volatility must be finite and non-negative".to_string(),
            ));
        }

        if self.mode == SimulationMode::Replay && self.replay_log_path.is_none() {
            return Err(ConfigError::Validation(
                "replay mode requires a replay log path".to_string(),
            ));
        }

        if self.mode == SimulationMode::Replay && self.event_log_path.is_some() {
            return Err(ConfigError::Validation(
                "event log cannot be written while replaying".to_string(),
            ));
        }

        if self.mode == SimulationMode::Simulate && self.replay_log_path.is_some() {
            return Err(ConfigError::Validation(
                "replay log path provided while mode is simulate".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_replay_requires_path() {
        let config = SimulationConfig {
            mode: SimulationMode::Replay,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_event_log_conflicts_with_replay() {
        let config = SimulationConfig {
            mode: SimulationMode::Replay,
            replay_log_path: Some(PathBuf::from("events.log")),
            event_log_path: Some(PathBuf::from("out.log")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let mut config = SimulationConfig {
            initial_price: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.initial_price = 100.0;
        config.spread = -0.1;
        assert!(config.validate().is_err());

        config.spread = 0.1;
        config.iterations = 0;
        assert!(config.validate().is_err());
    }
}
