//! Default values.

use crate::schema::*;
use racebar_common::LoggingConfig;

/// Bars visible at once in the reference renderer.
pub const DEFAULT_VISIBLE_CAP: usize = 12;

/// Top-set oversampling applied on top of the visible cap.
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 2;

/// Longest inclusive year span that still gets day granularity.
pub const DEFAULT_DAILY_YEAR_SPAN_LIMIT: u32 = 25;

/// Year, month and day.
pub const DEFAULT_MAX_CONCURRENT_PIPELINES: usize = 3;

/// Wikidata's skolem IRI prefix for blank nodes.
pub const WIKIDATA_GENID_PREFIX: &str = "http://www.wikidata.org/.well-known/genid";

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot: SnapshotConfig::default(),
            normalize: NormalizeConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            visible_cap: DEFAULT_VISIBLE_CAP,
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            unknown_prefixes: vec![WIKIDATA_GENID_PREFIX.to_string()],
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            daily_year_span_limit: DEFAULT_DAILY_YEAR_SPAN_LIMIT,
            trailing_fill: TrailingFill::default(),
            max_concurrent_pipelines: DEFAULT_MAX_CONCURRENT_PIPELINES,
        }
    }
}
