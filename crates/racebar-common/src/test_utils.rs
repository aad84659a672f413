//! Test utilities and shared fixtures for racebar.
//!
//! This module provides raw table builders and sample datasets that can be
//! used across all crates in the workspace for unit and integration testing.

use crate::{Cell, RawTable};
use chrono::NaiveDate;
use std::sync::Once;

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Create a calendar date, panicking on invalid input.
pub fn mock_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Build a raw table whose cells are all text.
pub fn text_table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable::new(
        columns.iter().map(ToString::to_string).collect(),
        rows.iter()
            .map(|row| row.iter().map(|cell| Cell::from(*cell)).collect())
            .collect(),
    )
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Sample datasets shaped like upstream query results.
pub mod table_fixtures {
    use super::*;

    /// Wikidata entity link for São Paulo.
    pub const SAO_PAULO_URL: &str = "http://www.wikidata.org/entity/Q174";
    /// Wikidata entity link for Porto Alegre.
    pub const PORTO_ALEGRE_URL: &str = "http://www.wikidata.org/entity/Q40269";
    /// Wikidata entity link for Fortaleza.
    pub const FORTALEZA_URL: &str = "http://www.wikidata.org/entity/Q43463";

    /// Three Brazilian cities with a URL identifier column and no category.
    pub fn city_population_table() -> RawTable {
        text_table(
            &["item", "itemLabel", "population", "date"],
            &[
                &[
                    PORTO_ALEGRE_URL,
                    "Porto Alegre",
                    "1332845",
                    "2022-01-01T00:00:00Z",
                ],
                &[FORTALEZA_URL, "Fortaleza", "2428708", "2022-01-01T00:00:00Z"],
                &[SAO_PAULO_URL, "São Paulo", "12325232", "2020-07-01T00:00:00Z"],
            ],
        )
    }

    /// A name/category/value/date table with one row per entity and year.
    pub fn yearly_table(rows: &[(&str, &str, f64, i32)]) -> RawTable {
        RawTable::new(
            vec![
                "country".to_string(),
                "continent".to_string(),
                "gdp".to_string(),
                "year".to_string(),
            ],
            rows.iter()
                .map(|(name, category, value, year)| {
                    vec![
                        Cell::from(*name),
                        Cell::from(*category),
                        Cell::Number(*value),
                        Cell::Text(format!("{year}-01-01")),
                    ]
                })
                .collect(),
        )
    }

    /// A minimal valid table spanning the inclusive years `first..=last`.
    pub fn span_table(first: i32, last: i32) -> RawTable {
        let start = format!("{first}-06-15");
        let end = format!("{last}-06-15");
        text_table(
            &["name", "value", "date"],
            &[&["alpha", "1", start.as_str()], &["alpha", "2", end.as_str()]],
        )
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for a dense, non-negative series of the given length range.
    pub fn dense_series_strategy(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.0f64..1.0e9, len)
    }

    /// Strategy for a sparse series where roughly half the points are unknown.
    pub fn sparse_series_strategy(
        len: std::ops::Range<usize>,
    ) -> impl Strategy<Value = Vec<Option<f64>>> {
        prop::collection::vec(prop::option::of(0.0f64..1.0e9), len)
    }

    /// Strategy for bucket values with frequent ties.
    pub fn tied_values_strategy() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec((0u8..5).prop_map(f64::from), 0..40)
    }
}
