//! Configuration loading from YAML, TOML or JSON files with environment overrides.

use crate::schema::Config;
use racebar_common::RaceError;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "RACEBAR_CONFIG_PATH";

/// File names probed in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 4] =
    ["racebar.yaml", "racebar.yml", "racebar.toml", "racebar.json"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension does not name a supported format
    #[error("Unsupported configuration format for '{0}', expected .yaml, .yml, .toml or .json")]
    UnsupportedFormat(PathBuf),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Name of the offending variable.
        var: String,
        /// Parse failure for its value.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for RaceError {
    fn from(err: ConfigError) -> Self {
        RaceError::config_with_source(err.to_string(), err)
    }
}

/// Configuration loader for the application
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Creates a loader reading from an explicit file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Creates a loader that discovers its file from the environment or the
    /// working directory.
    pub fn discover() -> Self {
        let path = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from).or_else(|| {
            DEFAULT_CONFIG_FILES
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
        });
        Self { path }
    }

    /// Path this loader reads from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads configuration, applying process environment overrides.
    pub fn load(&self) -> Result<Config, ConfigError> {
        self.load_with_env(|var| env::var(var).ok())
    }

    /// Loads configuration, resolving overrides through `lookup`.
    pub fn load_with_env<F>(&self, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.path {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                Self::load_file(path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Config::default()
            }
        };

        Self::apply_env_overrides(&mut config, lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration file, choosing the format by extension.
    pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(content)?),
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cap) = parse_env(&lookup, "RACEBAR_VISIBLE_CAP")? {
            config.snapshot.visible_cap = cap;
        }

        if let Some(factor) = parse_env(&lookup, "RACEBAR_OVERSAMPLE_FACTOR")? {
            config.snapshot.oversample_factor = factor;
        }

        if let Some(limit) = parse_env(&lookup, "RACEBAR_DAILY_YEAR_SPAN_LIMIT")? {
            config.pipeline.daily_year_span_limit = limit;
        }

        if let Some(fill) = lookup("RACEBAR_TRAILING_FILL") {
            config.pipeline.trailing_fill = fill.parse()?;
        }

        if let Some(workers) = parse_env(&lookup, "RACEBAR_MAX_CONCURRENT_PIPELINES")? {
            config.pipeline.max_concurrent_pipelines = workers;
        }

        if let Some(level) = lookup("RACEBAR_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(var)
        .map(|raw| {
            raw.trim().parse().map_err(|e| ConfigError::EnvParse {
                var: var.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TrailingFill;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = ConfigLoader::default().load_with_env(env_of(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::default()
            .load_with_env(env_of(&[
                ("RACEBAR_VISIBLE_CAP", "5"),
                ("RACEBAR_OVERSAMPLE_FACTOR", "3"),
                ("RACEBAR_DAILY_YEAR_SPAN_LIMIT", "10"),
                ("RACEBAR_TRAILING_FILL", "Zero"),
                ("RACEBAR_LOG_LEVEL", "debug"),
            ]))
            .unwrap();
        assert_eq!(config.snapshot.visible_cap, 5);
        assert_eq!(config.snapshot.head(), 15);
        assert_eq!(config.pipeline.daily_year_span_limit, 10);
        assert_eq!(config.pipeline.trailing_fill, TrailingFill::Zero);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_env_value_names_variable() {
        let err = ConfigLoader::default()
            .load_with_env(env_of(&[("RACEBAR_VISIBLE_CAP", "twelve")]))
            .unwrap_err();
        assert!(err.to_string().contains("RACEBAR_VISIBLE_CAP"));
    }

    #[test]
    fn test_env_override_is_validated() {
        let err = ConfigLoader::default()
            .load_with_env(env_of(&[("RACEBAR_VISIBLE_CAP", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::parse(Path::new("racebar.ini"), "").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_parse_formats_agree() {
        let yaml = ConfigLoader::parse(
            Path::new("a.yaml"),
            "snapshot:\n  visible_cap: 8\npipeline:\n  trailing_fill: zero\n",
        )
        .unwrap();
        let toml = ConfigLoader::parse(
            Path::new("a.toml"),
            "[snapshot]\nvisible_cap = 8\n\n[pipeline]\ntrailing_fill = \"zero\"\n",
        )
        .unwrap();
        let json = ConfigLoader::parse(
            Path::new("a.json"),
            r#"{"snapshot": {"visible_cap": 8}, "pipeline": {"trailing_fill": "zero"}}"#,
        )
        .unwrap();
        assert_eq!(yaml, toml);
        assert_eq!(toml, json);
        assert_eq!(json.snapshot.oversample_factor, 2);
    }
}
