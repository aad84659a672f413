//! Time axis construction and per-entity reindexing with interpolation.

use crate::normalizer::NormalizedTable;
use chrono::NaiveDate;
use racebar_common::{Element, Granularity};
use racebar_config::TrailingFill;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Every entity's values aligned to one time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedSeries {
    /// Granularity the axis was built at.
    pub granularity: Granularity,
    /// Gap-free, ascending bucket labels.
    pub axis: Vec<NaiveDate>,
    /// Entities in first-seen order.
    pub entities: Vec<Element>,
    /// `values[entity][bucket]`, one row per entity, one column per axis point.
    pub values: Vec<Vec<f64>>,
    /// `arrival[entity][bucket]`: index of the entity's first row in that
    /// bucket, or of its first row anywhere when the bucket holds none of its
    /// rows. Ties in ranking are broken by this key.
    pub arrival: Vec<Vec<usize>>,
}

impl InterpolatedSeries {
    /// Values of every entity at one axis position, in entity order.
    pub fn bucket_values(&self, bucket: usize) -> Vec<f64> {
        self.values.iter().map(|series| series[bucket]).collect()
    }

    /// Tie-break keys of every entity at one axis position, in entity order.
    pub fn bucket_arrival(&self, bucket: usize) -> Vec<usize> {
        self.arrival.iter().map(|keys| keys[bucket]).collect()
    }

    /// Full series for the entity named `name`.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.entities
            .iter()
            .position(|element| element.name == name)
            .map(|index| self.values[index].as_slice())
    }
}

/// Builds the gap-free axis covering `dates` at `granularity`.
///
/// The axis runs from the bucket holding the earliest date to the bucket
/// holding the latest, inclusive. No dates yields an empty axis.
pub fn time_axis<I>(dates: I, granularity: Granularity) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let bounds = dates.into_iter().fold(None, |acc: Option<(NaiveDate, NaiveDate)>, date| {
        let bucket = granularity.truncate(date);
        Some(acc.map_or((bucket, bucket), |(lo, hi)| (lo.min(bucket), hi.max(bucket))))
    });
    let Some((first, last)) = bounds else {
        return Vec::new();
    };

    let mut axis = Vec::new();
    let mut cursor = Some(first);
    while let Some(bucket) = cursor.filter(|bucket| *bucket <= last) {
        axis.push(bucket);
        cursor = granularity.next(bucket);
    }
    axis
}

/// Reindexes every entity of `table` onto `axis` and fills the gaps.
///
/// Rows are bucketed at `granularity`; when several rows of one entity land
/// in the same bucket only the first counts, and its row index becomes the
/// entity's arrival key for that bucket. Rows outside the axis are ignored.
#[instrument(skip(table, axis), fields(rows = table.len(), buckets = axis.len()))]
pub fn reindex(
    table: &NormalizedTable,
    axis: &[NaiveDate],
    granularity: Granularity,
    trailing: TrailingFill,
) -> InterpolatedSeries {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entities: Vec<Element> = Vec::new();
    let mut known: Vec<Vec<Option<f64>>> = Vec::new();
    let mut arrival: Vec<Vec<usize>> = Vec::new();
    let mut outside = 0usize;

    for (row_index, row) in table.rows().iter().enumerate() {
        let entity = *index.entry(row.name.as_str()).or_insert_with(|| {
            entities.push(Element {
                name: row.name.clone(),
                category: row.category.clone(),
                url: row.url.clone(),
            });
            known.push(vec![None; axis.len()]);
            arrival.push(vec![row_index; axis.len()]);
            entities.len() - 1
        });

        let Ok(position) = axis.binary_search(&granularity.truncate(row.date)) else {
            outside += 1;
            continue;
        };
        if known[entity][position].is_none() {
            known[entity][position] = Some(row.value);
            arrival[entity][position] = row_index;
        }
    }

    debug!(
        entities = entities.len(),
        outside,
        "Reindexed rows onto time axis"
    );

    InterpolatedSeries {
        granularity,
        axis: axis.to_vec(),
        entities,
        values: known.iter().map(|series| interpolate(series, trailing)).collect(),
        arrival,
    }
}

/// Fills the unknown points of one entity's series.
///
/// Points strictly between two known values are interpolated linearly by
/// position. Points before the first known value are zero. Points after the
/// last known value follow `trailing`. A series with no known value is zero
/// throughout.
pub fn interpolate(known: &[Option<f64>], trailing: TrailingFill) -> Vec<f64> {
    let points: Vec<(usize, f64)> = known
        .iter()
        .enumerate()
        .filter_map(|(position, value)| value.map(|value| (position, value)))
        .collect();

    let mut filled = vec![0.0; known.len()];
    for &(position, value) in &points {
        filled[position] = value;
    }

    for pair in points.windows(2) {
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        #[allow(clippy::cast_precision_loss)]
        let span = (end - start) as f64;
        for (step, slot) in filled[start + 1..end].iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let fraction = (step + 1) as f64 / span;
            *slot = (to - from).mul_add(fraction, from);
        }
    }

    if let (TrailingFill::Hold, Some(&(last, value))) = (trailing, points.last()) {
        for slot in &mut filled[last + 1..] {
            *slot = value;
        }
    }

    filled
}
