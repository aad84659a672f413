//! Per-bucket ranking.

use crate::bucketer::InterpolatedSeries;
use racebar_common::Element;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Ranks values in descending order, 1 being the largest.
///
/// Every position gets a distinct rank. Equal values keep their input order,
/// so the first-seen entity of a tie ranks higher.
pub fn rank(values: &[f64]) -> Vec<u32> {
    let arrival: Vec<usize> = (0..values.len()).collect();
    rank_with_arrival(values, &arrival)
}

/// Ranks values in descending order, breaking ties by ascending `arrival`.
///
/// `arrival` is parallel to `values`. Equal keys fall back to input order.
pub fn rank_with_arrival(values: &[f64], arrival: &[usize]) -> Vec<u32> {
    debug_assert_eq!(values.len(), arrival.len());
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .total_cmp(&values[a])
            .then_with(|| arrival[a].cmp(&arrival[b]))
    });

    let mut ranks = vec![0; values.len()];
    for (position, entity) in order.into_iter().enumerate() {
        ranks[entity] = to_rank(position + 1);
    }
    ranks
}

/// Ranks a single bucket, keyed by entity name.
pub fn rank_by_name<'a>(bucket: &[(&'a str, f64)]) -> HashMap<&'a str, u32> {
    let values: Vec<f64> = bucket.iter().map(|(_, value)| *value).collect();
    bucket
        .iter()
        .map(|(name, _)| *name)
        .zip(rank(&values))
        .collect()
}

pub(crate) fn to_rank(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}

/// An interpolated series with a rank for every entity at every bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSeries {
    /// The underlying values.
    pub series: InterpolatedSeries,
    /// `ranks[bucket][entity]`.
    pub ranks: Vec<Vec<u32>>,
}

impl RankedSeries {
    /// Rank of `name` at axis position `bucket`.
    pub fn rank_of(&self, name: &str, bucket: usize) -> Option<u32> {
        let entity = self
            .series
            .entities
            .iter()
            .position(|element| element.name == name)?;
        self.ranks.get(bucket).map(|ranks| ranks[entity])
    }

    /// Entities at one bucket with their value and rank, in entity order.
    pub fn bucket(&self, bucket: usize) -> impl Iterator<Item = (&Element, f64, u32)> + '_ {
        self.series
            .entities
            .iter()
            .zip(&self.series.values)
            .zip(&self.ranks[bucket])
            .map(move |((element, values), rank)| (element, values[bucket], *rank))
    }
}

/// Ranks every bucket of `series` independently.
///
/// Tied entities are ordered by their arrival key at that bucket, see
/// [`InterpolatedSeries::arrival`].
#[instrument(skip_all, fields(granularity = %series.granularity, buckets = series.axis.len()))]
pub fn rank_series(series: InterpolatedSeries) -> RankedSeries {
    let ranks: Vec<Vec<u32>> = (0..series.axis.len())
        .map(|bucket| {
            rank_with_arrival(&series.bucket_values(bucket), &series.bucket_arrival(bucket))
        })
        .collect();
    debug!(entities = series.entities.len(), "Ranked buckets");
    RankedSeries { series, ranks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketer::{reindex, time_axis};
    use crate::normalizer::normalize;
    use racebar_common::test_utils::{mock_date, text_table};
    use racebar_common::Granularity;
    use racebar_config::{NormalizeConfig, TrailingFill};

    #[test]
    fn test_rank_descending() {
        assert_eq!(rank(&[5.0, 50.0, 0.5]), vec![2, 1, 3]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        assert_eq!(rank(&[1.0, 3.0, 1.0, 3.0]), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_arrival_breaks_ties() {
        assert_eq!(rank_with_arrival(&[7.0, 7.0, 9.0], &[3, 2, 5]), vec![3, 2, 1]);
        assert_eq!(rank_with_arrival(&[7.0, 7.0], &[4, 4]), vec![1, 2]);
    }

    #[test]
    fn test_ties_follow_row_order_within_bucket() {
        let raw = text_table(
            &["name", "value", "date"],
            &[
                &["A", "1", "2020-01-01"],
                &["B", "2", "2020-01-01"],
                &["B", "7", "2021-01-01"],
                &["A", "7", "2021-01-01"],
            ],
        );
        let table = normalize(&raw, &NormalizeConfig::default()).unwrap();
        let axis = time_axis(table.dates(), Granularity::Year);
        let ranked = rank_series(reindex(&table, &axis, Granularity::Year, TrailingFill::Hold));

        assert_eq!(ranked.rank_of("B", 0), Some(1));
        assert_eq!(ranked.rank_of("B", 1), Some(1));
        assert_eq!(ranked.rank_of("A", 1), Some(2));
    }

    #[test]
    fn test_rank_by_name_ignores_alphabet() {
        let ranks = rank_by_name(&[("zulu", 7.0), ("alpha", 7.0)]);
        assert_eq!(ranks["zulu"], 1);
        assert_eq!(ranks["alpha"], 2);
    }

    #[test]
    fn test_rank_series_per_bucket() {
        let series = InterpolatedSeries {
            granularity: Granularity::Year,
            axis: vec![mock_date(2020, 1, 1), mock_date(2021, 1, 1)],
            entities: vec![Element::named("a"), Element::named("b")],
            values: vec![vec![1.0, 9.0], vec![2.0, 3.0]],
            arrival: vec![vec![0, 0], vec![1, 1]],
        };
        let ranked = rank_series(series);
        assert_eq!(ranked.ranks, vec![vec![2, 1], vec![1, 2]]);
        assert_eq!(ranked.rank_of("a", 1), Some(1));
        assert_eq!(ranked.rank_of("missing", 0), None);

        let first: Vec<(String, f64, u32)> = ranked
            .bucket(0)
            .map(|(element, value, rank)| (element.name.clone(), value, rank))
            .collect();
        assert_eq!(
            first,
            vec![("a".to_string(), 1.0, 2), ("b".to_string(), 2.0, 1)]
        );
    }
}
