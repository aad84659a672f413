//! Snapshot assembly with fade-out carry-forward.
//!
//! Buckets are walked latest-first. Each bucket keeps its top
//! `visible_cap * oversample_factor` entities by rank; any entity that had a
//! positive value in the bucket processed just before (the chronologically
//! later one) but fell out of the current top set is appended once at value
//! zero, ranked after the current positive entries. Renderers use those
//! zero-valued entries to animate the bar instead of popping it.

use crate::ranker::{to_rank, RankedSeries};
use racebar_common::{Snapshot, SnapshotEntry};
use racebar_config::SnapshotConfig;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Builds the chronologically ascending snapshot sequence.
#[instrument(skip_all, fields(granularity = %ranked.series.granularity, buckets = ranked.series.axis.len()))]
pub fn build_snapshots(ranked: &RankedSeries, config: &SnapshotConfig) -> Vec<Snapshot> {
    let series = &ranked.series;
    let head = config.head();

    let mut snapshots = Vec::with_capacity(series.axis.len());
    let mut last: Vec<SnapshotEntry> = Vec::new();
    let mut carried_total = 0usize;

    for (bucket, date) in series.axis.iter().enumerate().rev() {
        let ranks = &ranked.ranks[bucket];
        let mut order: Vec<usize> = (0..series.entities.len()).collect();
        order.sort_by_key(|&entity| ranks[entity]);
        order.truncate(head);

        let mut values: Vec<SnapshotEntry> = order
            .into_iter()
            .map(|entity| {
                SnapshotEntry::from_element(
                    &series.entities[entity],
                    series.values[entity][bucket],
                    ranks[entity],
                )
            })
            .collect();

        let mut carried: Vec<SnapshotEntry> = {
            let present: HashSet<&str> = values.iter().map(|entry| entry.name.as_str()).collect();
            last.into_iter()
                .filter(|entry| !present.contains(entry.name.as_str()))
                .collect()
        };

        if !carried.is_empty() {
            let floor = values
                .iter()
                .filter(|entry| entry.value > 0.0)
                .map(|entry| entry.rank)
                .max()
                .unwrap_or(0);
            carried.sort_by(|a, b| b.value.total_cmp(&a.value));
            for (offset, entry) in carried.iter_mut().enumerate() {
                entry.rank = floor.saturating_add(to_rank(offset + 1));
                entry.value = 0.0;
            }
            carried_total += carried.len();
            values.extend(carried);
        }

        last = values
            .iter()
            .filter(|entry| entry.value > 0.0)
            .cloned()
            .collect();
        snapshots.push(Snapshot {
            date: *date,
            values,
        });
    }

    snapshots.reverse();
    debug!(
        snapshots = snapshots.len(),
        carried = carried_total,
        "Assembled snapshots"
    );
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketer::InterpolatedSeries;
    use crate::ranker::rank_series;
    use racebar_common::test_utils::mock_date;
    use racebar_common::{Element, Granularity};

    fn ranked(values: Vec<Vec<f64>>) -> RankedSeries {
        let buckets = values.first().map_or(0, Vec::len);
        let entities = (0..values.len())
            .map(|i| Element::named(format!("e{i}")))
            .collect();
        let arrival = (0..values.len()).map(|i| vec![i; buckets]).collect();
        rank_series(InterpolatedSeries {
            granularity: Granularity::Year,
            axis: (0..buckets)
                .map(|i| mock_date(2000 + i32::try_from(i).unwrap(), 1, 1))
                .collect(),
            entities,
            values,
            arrival,
        })
    }

    fn cap(visible_cap: usize) -> SnapshotConfig {
        SnapshotConfig {
            visible_cap,
            oversample_factor: 2,
        }
    }

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.values.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn test_snapshots_are_chronological_and_capped() {
        let series = ranked(vec![
            vec![1.0, 2.0],
            vec![4.0, 3.0],
            vec![2.0, 9.0],
            vec![3.0, 1.0],
        ]);
        let snapshots = build_snapshots(&series, &cap(1));
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].date, mock_date(2000, 1, 1));
        assert_eq!(snapshots[1].date, mock_date(2001, 1, 1));
        assert_eq!(names(&snapshots[1]), vec!["e2", "e1"]);
    }

    #[test]
    fn test_entity_leaving_top_set_fades_once() {
        // e2 is in the top two at the last bucket only.
        let series = ranked(vec![
            vec![10.0, 10.0, 10.0],
            vec![8.0, 8.0, 8.0],
            vec![1.0, 1.0, 50.0],
        ]);
        let snapshots = build_snapshots(&series, &cap(1));

        let latest = &snapshots[2];
        assert_eq!(names(latest), vec!["e2", "e0"]);

        let faded = &snapshots[1];
        assert_eq!(names(faded), vec!["e0", "e1", "e2"]);
        let entry = faded.entry("e2").unwrap();
        assert_eq!(entry.value, 0.0);
        assert_eq!(entry.rank, 3);

        assert_eq!(names(&snapshots[0]), vec!["e0", "e1"]);
    }

    #[test]
    fn test_carried_entries_keep_relative_order() {
        let series = ranked(vec![
            vec![10.0, 1.0],
            vec![9.0, 2.0],
            vec![1.0, 30.0],
            vec![1.0, 20.0],
        ]);
        let snapshots = build_snapshots(&series, &cap(1));
        let faded: Vec<(&str, u32)> = snapshots[0]
            .values
            .iter()
            .filter(|entry| entry.value == 0.0)
            .map(|entry| (entry.name.as_str(), entry.rank))
            .collect();
        assert_eq!(faded, vec![("e2", 3), ("e3", 4)]);
    }

    #[test]
    fn test_zero_valued_top_entries_do_not_fade() {
        let series = ranked(vec![vec![0.0, 5.0], vec![0.0, 0.0], vec![0.0, 0.0]]);
        let snapshots = build_snapshots(&series, &cap(1));
        assert!(snapshots[0].values.iter().all(|entry| entry.rank <= 2));
        assert_eq!(snapshots[0].values.len(), 2);
    }

    #[test]
    fn test_empty_series() {
        let series = ranked(Vec::new());
        assert!(build_snapshots(&series, &cap(12)).is_empty());
    }
}
