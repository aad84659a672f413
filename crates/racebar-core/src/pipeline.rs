//! One granularity's bucket → rank → snapshot run.

use crate::bucketer::{reindex, time_axis};
use crate::normalizer::NormalizedTable;
use crate::ranker::rank_series;
use crate::snapshot::build_snapshots;
use racebar_common::{Granularity, Snapshot};
use racebar_config::Config;
use tracing::{debug, instrument};

/// Runs the full pipeline for a single granularity.
///
/// Pure with respect to `table`; safe to run for several granularities at
/// once over the same shared table.
#[instrument(skip(table, config), fields(rows = table.len()))]
pub fn run_granularity(
    table: &NormalizedTable,
    granularity: Granularity,
    config: &Config,
) -> Vec<Snapshot> {
    let axis = time_axis(table.dates(), granularity);
    let series = reindex(table, &axis, granularity, config.pipeline.trailing_fill);
    let ranked = rank_series(series);
    let snapshots = build_snapshots(&ranked, &config.snapshot);
    debug!(
        buckets = axis.len(),
        snapshots = snapshots.len(),
        "Granularity pipeline finished"
    );
    snapshots
}
