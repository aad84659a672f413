//! Runtime validation entry point.

use crate::schema::Config;
use racebar_common::Result;
use tracing::warn;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, converting failures into the crate-wide error type.
    pub fn validate(config: &Config) -> Result<()> {
        config.validate().map_err(|err| {
            warn!(error = %err, "Rejected configuration");
            err.into()
        })
    }
}
