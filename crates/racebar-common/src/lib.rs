//! # Racebar Common
//!
//! Shared types, utilities, and common functionality for racebar.
//!
//! This crate provides the raw and output record types, the error taxonomy,
//! and the logging setup used across all other crates in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{NormalizeError, RaceError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
pub use utils::*;
