//! Configuration schema definitions using serde.

use crate::loader::ConfigError;
use racebar_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main configuration structure for racebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot builder configuration.
    pub snapshot: SnapshotConfig,
    /// Column normalizer configuration.
    pub normalize: NormalizeConfig,
    /// Granularity pipeline configuration.
    pub pipeline: PipelineConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Snapshot builder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Number of bars a renderer shows at once.
    pub visible_cap: usize,
    /// Multiplier applied to `visible_cap` when selecting the top set, so
    /// faded-out entries never push real ones below the cap.
    pub oversample_factor: usize,
}

impl SnapshotConfig {
    /// Number of ranked entities kept per bucket before fade-out entries are appended.
    pub const fn head(&self) -> usize {
        self.visible_cap.saturating_mul(self.oversample_factor)
    }
}

/// Column normalizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Cell prefixes marking an unresolved placeholder identifier; rows
    /// containing such a cell are dropped.
    pub unknown_prefixes: Vec<String>,
}

impl NormalizeConfig {
    /// Returns true when `text` starts with any configured placeholder prefix.
    pub fn is_unknown(&self, text: &str) -> bool {
        self.unknown_prefixes
            .iter()
            .any(|prefix| text.starts_with(prefix.as_str()))
    }
}

/// What happens to an entity's series after its last known value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingFill {
    /// Repeat the last known value until the end of the axis.
    #[default]
    Hold,
    /// Drop to zero after the last known value.
    Zero,
}

impl fmt::Display for TrailingFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hold => f.write_str("hold"),
            Self::Zero => f.write_str("zero"),
        }
    }
}

impl FromStr for TrailingFill {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold" => Ok(Self::Hold),
            "zero" => Ok(Self::Zero),
            other => Err(ConfigError::Validation(format!(
                "unknown trailing fill '{other}', expected 'hold' or 'zero'"
            ))),
        }
    }
}

/// Granularity pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest inclusive year span for which day granularity is computed.
    pub daily_year_span_limit: u32,
    /// Fill policy after an entity's last known value.
    pub trailing_fill: TrailingFill,
    /// Upper bound on granularity pipelines running at once.
    pub max_concurrent_pipelines: usize,
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot.visible_cap == 0 {
            return Err(ConfigError::Validation(
                "snapshot.visible_cap must be at least 1".to_string(),
            ));
        }

        if self.snapshot.oversample_factor == 0 {
            return Err(ConfigError::Validation(
                "snapshot.oversample_factor must be at least 1".to_string(),
            ));
        }

        if self.pipeline.daily_year_span_limit == 0 {
            return Err(ConfigError::Validation(
                "pipeline.daily_year_span_limit must be at least 1".to_string(),
            ));
        }

        if self.pipeline.max_concurrent_pipelines == 0 {
            return Err(ConfigError::Validation(
                "pipeline.max_concurrent_pipelines must be at least 1".to_string(),
            ));
        }

        if self.normalize.unknown_prefixes.iter().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "normalize.unknown_prefixes must not contain empty prefixes".to_string(),
            ));
        }

        Ok(())
    }
}
