//! # Racebar
//!
//! Command-line front end: reads a raw table as JSON, runs the race
//! orchestrator and writes the outbound document.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod error;

pub use app::*;
pub use error::*;
