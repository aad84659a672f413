//! # Racebar Core
//!
//! Turns a raw table of `(label..., value, date)` rows into the ranked,
//! time-bucketed snapshot sequence a bar chart race renderer animates.
//!
//! The stages run leaves first: [`normalizer`] resolves column roles,
//! [`bucketer`] builds the time axis and interpolates each entity onto it,
//! [`ranker`] orders entities per bucket, [`snapshot`] assembles the visible
//! frames, and [`orchestrator`] fans the last three out over year, month and
//! day granularity.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bucketer;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;
pub mod ranker;
pub mod snapshot;

pub use bucketer::*;
pub use normalizer::*;
pub use orchestrator::*;
pub use pipeline::*;
pub use ranker::*;
pub use snapshot::*;
