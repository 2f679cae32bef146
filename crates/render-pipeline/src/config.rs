//! Configuration for the contour pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the contour pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Capacity of the queue between the generator and drawer stages.
    pub queue_capacity: usize,

    /// Worker threads in the generation pool (one task per dataset).
    pub generator_threads: usize,

    /// How long the drawer waits on an empty queue before re-checking
    /// cancellation.
    pub drawer_poll_ms: u64,

    /// Wall-clock budget for the immediate rendering path.
    pub immediate_budget_ms: u64,

    /// Extraction mode used by the immediate rendering path.
    pub immediate_mode: ImmediateMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4,
            generator_threads: 16,
            drawer_poll_ms: 100,
            immediate_budget_ms: 4000,
            immediate_mode: ImmediateMode::Walk,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CONTOUR_QUEUE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.queue_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_GENERATOR_THREADS") {
            if let Ok(threads) = val.parse() {
                config.generator_threads = threads;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_DRAWER_POLL_MS") {
            if let Ok(ms) = val.parse() {
                config.drawer_poll_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_IMMEDIATE_BUDGET_MS") {
            if let Ok(ms) = val.parse() {
                config.immediate_budget_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_IMMEDIATE_MODE") {
            config.immediate_mode = ImmediateMode::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be > 0".to_string());
        }

        if self.generator_threads == 0 {
            return Err("generator_threads must be > 0".to_string());
        }

        if self.drawer_poll_ms == 0 {
            return Err("drawer_poll_ms must be > 0".to_string());
        }

        Ok(())
    }

    pub fn drawer_poll(&self) -> Duration {
        Duration::from_millis(self.drawer_poll_ms)
    }

    pub fn immediate_budget(&self) -> Duration {
        Duration::from_millis(self.immediate_budget_ms)
    }
}

/// How the immediate path turns a chunk into strokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImmediateMode {
    /// Cell grid plus connected walk (long strokes).
    #[default]
    Walk,
    /// Independent segment pairs, one stroke per level.
    Segments,
}

impl ImmediateMode {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "segments" | "segment" => Self::Segments,
            _ => Self::Walk,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Segments => "segments",
        }
    }
}

impl std::fmt::Display for ImmediateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queue_capacity, 4);
        assert_eq!(config.drawer_poll(), Duration::from_millis(100));
        assert_eq!(config.immediate_budget(), Duration::from_secs(4));
        assert_eq!(config.immediate_mode, ImmediateMode::Walk);
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = PipelineConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            generator_threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            drawer_poll_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("CONTOUR_QUEUE_CAPACITY", "9");
        std::env::set_var("CONTOUR_IMMEDIATE_MODE", "Segments");
        std::env::set_var("CONTOUR_DRAWER_POLL_MS", "not-a-number");
        let config = PipelineConfig::from_env();
        std::env::remove_var("CONTOUR_QUEUE_CAPACITY");
        std::env::remove_var("CONTOUR_IMMEDIATE_MODE");
        std::env::remove_var("CONTOUR_DRAWER_POLL_MS");

        assert_eq!(config.queue_capacity, 9);
        assert_eq!(config.immediate_mode, ImmediateMode::Segments);
        assert_eq!(config.drawer_poll_ms, 100);
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&ImmediateMode::Segments).unwrap();
        assert_eq!(json, "\"segments\"");
        let config: PipelineConfig = serde_json::from_str(
            r#"{"queue_capacity":2,"generator_threads":1,"drawer_poll_ms":5,
                "immediate_budget_ms":10,"immediate_mode":"walk"}"#,
        )
        .unwrap();
        assert_eq!(config.immediate_mode, ImmediateMode::Walk);
    }
}
