//! # Racebar Config
//!
//! Type-safe configuration management for racebar.
//!
//! This crate provides configuration loading, validation, and caching with
//! atomic updates so a reloaded configuration applies to the next request.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
