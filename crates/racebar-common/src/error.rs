//! Error types for racebar.
//!
//! [`NormalizeError`] covers structural problems with the input table. It is a
//! caller-facing outcome rather than a fault: the orchestrator turns it into a
//! `{"failed": ...}` document. [`RaceError`] is everything else.

use crate::types::Granularity;
use thiserror::Error;

/// Result type alias for racebar operations
pub type Result<T> = std::result::Result<T, RaceError>;

/// Structural rejection of a raw table by the column normalizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Column count outside the accepted range, or a row that does not match
    /// the header width.
    #[error("{}", shape_message(.columns, .row))]
    Shape {
        /// Declared column count.
        columns: usize,
        /// Index of the first ragged row, if the header itself was acceptable.
        row: Option<usize>,
    },

    /// The last column holds a cell that is not an ISO-8601 timestamp.
    #[error("last column must be a date column")]
    DateColumn {
        /// Index of the offending row.
        row: usize,
        /// Textual form of the offending cell.
        cell: String,
    },

    /// The second-to-last column holds a cell that is not a finite number.
    #[error("second to last column must be a quantity column")]
    ValueColumn {
        /// Index of the offending row.
        row: usize,
        /// Textual form of the offending cell.
        cell: String,
    },

    /// No label column could take the `name` role.
    #[error("there should be at least one label")]
    LabelMissing,
}

fn shape_message(columns: &usize, row: &Option<usize>) -> String {
    match row {
        Some(row) => format!("row {row} does not have {columns} cells"),
        None => "number of columns must be between 3 and 5".to_string(),
    }
}

impl NormalizeError {
    /// Stable name of the error kind, for logs and metrics labels.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Shape { .. } => "ShapeError",
            Self::DateColumn { .. } => "DateColumnError",
            Self::ValueColumn { .. } => "ValueColumnError",
            Self::LabelMissing => "LabelMissingError",
        }
    }
}

/// Main error type for racebar operations
#[derive(Error, Debug)]
pub enum RaceError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong.
        message: String,
        /// Underlying cause, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A granularity pipeline died after normalization succeeded.
    #[error("{granularity} pipeline failed: {message}")]
    Pipeline {
        /// Granularity whose pipeline failed.
        granularity: Granularity,
        /// Join or permit failure description.
        message: String,
    },
}

impl RaceError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(granularity: Granularity, msg: impl Into<String>) -> Self {
        Self::Pipeline {
            granularity,
            message: msg.into(),
        }
    }

    /// Returns true for configuration errors
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
