//! Application-wide error types using thiserror.

use racebar_common::RaceError;
use racebar_config::ConfigError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input was not a `{columns, rows}` table.
    #[error("Invalid input table: {0}")]
    Input(#[source] serde_json::Error),

    /// Outbound document could not be written.
    #[error("Failed to write output: {0}")]
    Output(#[source] serde_json::Error),

    /// A pipeline failed after the table was accepted.
    #[error(transparent)]
    Race(#[from] RaceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the application.
pub type AppResult<T> = Result<T, AppError>;
