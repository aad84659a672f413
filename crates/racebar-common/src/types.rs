//! Raw input cells, time granularities, and the outbound race chart records.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A single cell of a raw table.
///
/// Upstream query services hand back either string bindings or native JSON
/// scalars, so the cell deserializes from any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(f64),
    /// String literal.
    Text(String),
}

impl Cell {
    /// Returns the textual form of the cell, or `None` for null.
    ///
    /// Integral numbers render without a fractional part so that `2020.0`
    /// reads back as `"2020"`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(Cow::Owned(b.to_string())),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                #[allow(clippy::cast_possible_truncation)]
                Some(Cow::Owned((*n as i64).to_string()))
            }
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::Text(s) => Some(Cow::Borrowed(s)),
        }
    }

    /// Casts the cell to a finite float.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Null => return None,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Returns true for [`Cell::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Tabular input as produced by the upstream query service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers, in order.
    pub columns: Vec<String>,
    /// Rows of cells; each row is expected to have one cell per column.
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Creates a raw table from headers and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Number of columns declared by the header.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Time bucketing resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per calendar year, labelled `YYYY-01-01`.
    Year,
    /// One bucket per calendar month, labelled `YYYY-MM-01`.
    Month,
    /// One bucket per day, labelled `YYYY-MM-DD`.
    Day,
}

impl Granularity {
    /// All granularities, coarsest first.
    pub const ALL: [Self; 3] = [Self::Year, Self::Month, Self::Day];

    /// Truncates a date to the start of its bucket.
    pub fn truncate(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Year => date - Duration::days(i64::from(date.ordinal0())),
            Self::Month => date - Duration::days(i64::from(date.day0())),
            Self::Day => date,
        }
    }

    /// Returns the label of the bucket following `bucket`.
    ///
    /// `bucket` must already be truncated to this granularity.
    pub fn next(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Year => NaiveDate::from_ymd_opt(bucket.year() + 1, 1, 1),
            Self::Month => bucket.checked_add_months(Months::new(1)),
            Self::Day => bucket.succ_opt(),
        }
    }

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
        }
    }

    /// Key under which this granularity's snapshots appear in the output.
    pub const fn output_key(self) -> &'static str {
        match self {
            Self::Year => "values_by_date",
            Self::Month => "values_by_date_monthly",
            Self::Day => "values_by_date_daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A distinct entity with its first-seen labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    /// Display label.
    pub name: String,
    /// Secondary grouping label, when the table has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Canonical identifier link, when the table has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Element {
    /// Creates an element carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            url: None,
        }
    }
}

/// One entity's visible state inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Display label.
    pub name: String,
    /// Secondary grouping label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Canonical identifier link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Interpolated value at this bucket; zero for faded-out entries.
    pub value: f64,
    /// 1-based rank, 1 being the largest value.
    pub rank: u32,
}

impl SnapshotEntry {
    /// Builds an entry from an element and its ranked value.
    pub fn from_element(element: &Element, value: f64, rank: u32) -> Self {
        Self {
            name: element.name.clone(),
            category: element.category.clone(),
            url: element.url.clone(),
            value,
            rank,
        }
    }
}

/// The visible state of the race at one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Bucket label.
    pub date: NaiveDate,
    /// Entries ordered by rank, faded-out entries last.
    pub values: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Looks up an entry by entity name.
    pub fn entry(&self, name: &str) -> Option<&SnapshotEntry> {
        self.values.iter().find(|entry| entry.name == name)
    }
}

/// Everything a renderer needs to animate a bar chart race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceChart {
    /// Distinct entities in first-seen order.
    pub elements: Vec<Element>,
    /// Year-granularity snapshots.
    pub values_by_date: Vec<Snapshot>,
    /// Month-granularity snapshots.
    pub values_by_date_monthly: Vec<Snapshot>,
    /// Day-granularity snapshots, omitted on long time spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_by_date_daily: Option<Vec<Snapshot>>,
}

impl RaceChart {
    /// Returns the snapshots computed for `granularity`, if any.
    pub fn snapshots(&self, granularity: Granularity) -> Option<&[Snapshot]> {
        match granularity {
            Granularity::Year => Some(&self.values_by_date),
            Granularity::Month => Some(&self.values_by_date_monthly),
            Granularity::Day => self.values_by_date_daily.as_deref(),
        }
    }
}

/// Result of processing a raw table: a chart or a caller-facing failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RaceOutcome {
    /// Processing succeeded.
    Ready(RaceChart),
    /// The input was structurally unusable.
    Failed {
        /// Human-readable reason.
        failed: String,
    },
}

impl RaceOutcome {
    /// Returns true when the input was rejected.
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the chart on success.
    pub const fn chart(&self) -> Option<&RaceChart> {
        match self {
            Self::Ready(chart) => Some(chart),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the failure message on rejection.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Failed { failed } => Some(failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cell_deserializes_mixed_json() {
        let cells: Vec<Cell> = serde_json::from_str(r#"[null, true, 12.5, "abc"]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                Cell::Null,
                Cell::Bool(true),
                Cell::Number(12.5),
                Cell::Text("abc".to_string())
            ]
        );
    }

    #[test]
    fn test_cell_as_text() {
        assert_eq!(Cell::Number(2020.0).as_text().as_deref(), Some("2020"));
        assert_eq!(Cell::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Cell::from("x").as_text().as_deref(), Some("x"));
        assert!(Cell::Null.as_text().is_none());
    }

    #[test]
    fn test_cell_as_f64() {
        assert_eq!(Cell::from(" 42 ").as_f64(), Some(42.0));
        assert_eq!(Cell::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Cell::from("abc").as_f64(), None);
        assert_eq!(Cell::from("NaN").as_f64(), None);
        assert_eq!(Cell::from("inf").as_f64(), None);
        assert_eq!(Cell::Null.as_f64(), None);
    }

    #[test]
    fn test_granularity_truncate() {
        let d = date(2021, 7, 19);
        assert_eq!(Granularity::Year.truncate(d), date(2021, 1, 1));
        assert_eq!(Granularity::Month.truncate(d), date(2021, 7, 1));
        assert_eq!(Granularity::Day.truncate(d), d);
    }

    #[test]
    fn test_granularity_next_crosses_boundaries() {
        assert_eq!(Granularity::Year.next(date(2021, 1, 1)), Some(date(2022, 1, 1)));
        assert_eq!(Granularity::Month.next(date(2021, 12, 1)), Some(date(2022, 1, 1)));
        assert_eq!(Granularity::Day.next(date(2024, 2, 28)), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_outcome_serializes_failure_shape() {
        let outcome = RaceOutcome::Failed {
            failed: "there should be at least one label".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"failed": "there should be at least one label"})
        );
    }

    #[test]
    fn test_chart_omits_missing_daily_and_optional_labels() {
        let chart = RaceChart {
            elements: vec![Element::named("Fortaleza")],
            values_by_date: vec![Snapshot {
                date: date(2022, 1, 1),
                values: vec![SnapshotEntry::from_element(
                    &Element::named("Fortaleza"),
                    10.0,
                    1,
                )],
            }],
            values_by_date_monthly: Vec::new(),
            values_by_date_daily: None,
        };
        let json = serde_json::to_value(RaceOutcome::Ready(chart)).unwrap();
        assert!(json.get("values_by_date_daily").is_none());
        assert_eq!(json["elements"][0], serde_json::json!({"name": "Fortaleza"}));
        assert_eq!(json["values_by_date"][0]["date"], "2022-01-01");
        assert_eq!(json["values_by_date"][0]["values"][0]["rank"], 1);
    }
}
