//! Column role inference and structural validation of raw tables.
//!
//! The last column is always the date and the second-to-last the value. The
//! remaining label columns are scanned left to right: the first URL-shaped
//! column becomes `url`, the first other column becomes `name`, and anything
//! after that becomes `category`.

use chrono::NaiveDate;
use racebar_common::{is_http_url, parse_iso_date, year_span, Cell, Element, NormalizeError, RawTable};
use racebar_config::NormalizeConfig;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Fewest columns a raw table may have: name, value, date.
pub const MIN_COLUMNS: usize = 3;

/// Most columns a raw table may have: url, name, category, value, date.
pub const MAX_COLUMNS: usize = 5;

/// Semantic role of a column after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    /// Entity display label.
    Name,
    /// Secondary grouping label.
    Category,
    /// Canonical identifier link.
    Url,
    /// Measured quantity.
    Value,
    /// Observation date.
    Date,
}

impl ColumnRole {
    /// Column name used in the normalized table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Url => "url",
            Self::Value => "value",
            Self::Date => "date",
        }
    }
}

/// One validated observation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Entity display label.
    pub name: String,
    /// Secondary grouping label, when the table has a category column.
    pub category: Option<String>,
    /// Canonical identifier link, when the table has a URL column.
    pub url: Option<String>,
    /// Finite measured value.
    pub value: f64,
    /// Observation date at day precision.
    pub date: NaiveDate,
}

/// Role-resolved, validated and de-duplicated table.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    has_category: bool,
    has_url: bool,
    rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    /// Roles present in this table, in output column order.
    pub fn columns(&self) -> Vec<ColumnRole> {
        let mut columns = vec![ColumnRole::Name];
        if self.has_category {
            columns.push(ColumnRole::Category);
        }
        if self.has_url {
            columns.push(ColumnRole::Url);
        }
        columns.extend([ColumnRole::Value, ColumnRole::Date]);
        columns
    }

    /// Whether a category column was resolved.
    pub const fn has_category(&self) -> bool {
        self.has_category
    }

    /// Whether a URL column was resolved.
    pub const fn has_url(&self) -> bool {
        self.has_url
    }

    /// Rows in input order.
    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All observation dates in row order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|row| row.date)
    }

    /// Inclusive number of calendar years covered; zero for an empty table.
    pub fn year_span(&self) -> u32 {
        year_span(self.dates())
    }

    /// Distinct entities in first-seen order, each with its first-seen labels.
    pub fn elements(&self) -> Vec<Element> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.name.as_str()))
            .map(|row| Element {
                name: row.name.clone(),
                category: row.category.clone(),
                url: row.url.clone(),
            })
            .collect()
    }
}

/// Assigns roles to the label columns (everything left of value and date).
///
/// Only the first row is inspected for URL shape; a table without rows gets
/// `name` for its first label column.
pub fn assign_label_roles(first_row: Option<&[Cell]>, label_columns: usize) -> Vec<ColumnRole> {
    (0..label_columns).fold(Vec::with_capacity(label_columns), |mut roles, column| {
        let url_shaped = first_row
            .and_then(|row| row.get(column))
            .and_then(Cell::as_text)
            .is_some_and(|text| is_http_url(&text));

        let role = if url_shaped && !roles.contains(&ColumnRole::Url) {
            ColumnRole::Url
        } else if !roles.contains(&ColumnRole::Name) {
            ColumnRole::Name
        } else {
            ColumnRole::Category
        };
        roles.push(role);
        roles
    })
}

/// Validates a raw table and resolves its column roles.
#[instrument(skip_all, fields(columns = raw.column_count(), rows = raw.row_count()))]
pub fn normalize(raw: &RawTable, config: &NormalizeConfig) -> Result<NormalizedTable, NormalizeError> {
    let width = raw.column_count();
    if !(MIN_COLUMNS..=MAX_COLUMNS).contains(&width) {
        return Err(NormalizeError::Shape {
            columns: width,
            row: None,
        });
    }
    if let Some(row) = raw.rows.iter().position(|row| row.len() != width) {
        return Err(NormalizeError::Shape {
            columns: width,
            row: Some(row),
        });
    }

    let rows: Vec<(usize, &[Cell])> = raw
        .rows
        .iter()
        .map(Vec::as_slice)
        .enumerate()
        .filter(|(_, cells)| !cells.iter().any(|cell| is_placeholder(cell, config)))
        .collect();
    debug!(
        dropped = raw.row_count() - rows.len(),
        "Removed rows holding placeholder identifiers"
    );

    let date_column = width - 1;
    let value_column = width - 2;

    let dates = rows
        .iter()
        .map(|(index, cells)| {
            let cell = &cells[date_column];
            cell.as_text()
                .and_then(|text| parse_iso_date(&text))
                .ok_or_else(|| NormalizeError::DateColumn {
                    row: *index,
                    cell: describe(cell),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let values = rows
        .iter()
        .map(|(index, cells)| {
            let cell = &cells[value_column];
            cell.as_f64().ok_or_else(|| NormalizeError::ValueColumn {
                row: *index,
                cell: describe(cell),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let roles = assign_label_roles(rows.first().map(|(_, cells)| *cells), value_column);
    let name_column = roles
        .iter()
        .position(|role| *role == ColumnRole::Name)
        .ok_or(NormalizeError::LabelMissing)?;
    let url_column = roles.iter().position(|role| *role == ColumnRole::Url);
    let category_column = roles.iter().rposition(|role| *role == ColumnRole::Category);
    debug!(?roles, "Resolved label column roles");

    let mut seen: HashMap<String, HashSet<NaiveDate>> = HashMap::new();
    let mut normalized = Vec::with_capacity(rows.len());
    for (((_, cells), date), value) in rows.iter().zip(dates).zip(values) {
        let name = cells[name_column]
            .as_text()
            .map(Cow::into_owned)
            .unwrap_or_default();
        if !seen.entry(name.clone()).or_default().insert(date) {
            continue;
        }
        normalized.push(NormalizedRow {
            name,
            category: category_column.and_then(|column| label(&cells[column])),
            url: url_column.and_then(|column| label(&cells[column])),
            value,
            date,
        });
    }
    debug!(
        duplicates = rows.len() - normalized.len(),
        kept = normalized.len(),
        "De-duplicated rows on (name, date)"
    );

    Ok(NormalizedTable {
        has_category: category_column.is_some(),
        has_url: url_column.is_some(),
        rows: normalized,
    })
}

fn is_placeholder(cell: &Cell, config: &NormalizeConfig) -> bool {
    cell.as_text().is_some_and(|text| config.is_unknown(&text))
}

fn label(cell: &Cell) -> Option<String> {
    cell.as_text().map(Cow::into_owned)
}

fn describe(cell: &Cell) -> String {
    cell.as_text()
        .map_or_else(|| "null".to_string(), Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use racebar_common::test_utils::{mock_date, table_fixtures, text_table};

    fn config() -> NormalizeConfig {
        NormalizeConfig::default()
    }

    #[test]
    fn test_column_count_bounds() {
        let two = text_table(&["name", "date"], &[&["a", "2020"]]);
        let six = text_table(&["a", "b", "c", "d", "value", "date"], &[]);
        assert_eq!(
            normalize(&two, &config()),
            Err(NormalizeError::Shape { columns: 2, row: None })
        );
        assert_eq!(
            normalize(&six, &config()),
            Err(NormalizeError::Shape { columns: 6, row: None })
        );
    }

    #[test]
    fn test_ragged_row_is_shape_error() {
        let mut table = text_table(&["name", "value", "date"], &[&["a", "1", "2020"]]);
        table.rows.push(vec![Cell::from("b"), Cell::from("2")]);
        assert_eq!(
            normalize(&table, &config()),
            Err(NormalizeError::Shape { columns: 3, row: Some(1) })
        );
    }

    #[test]
    fn test_url_column_takes_url_role() {
        let table = normalize(&table_fixtures::city_population_table(), &config()).unwrap();
        assert_eq!(
            table.columns(),
            vec![ColumnRole::Name, ColumnRole::Url, ColumnRole::Value, ColumnRole::Date]
        );
        let first = &table.rows()[0];
        assert_eq!(first.name, "Porto Alegre");
        assert_eq!(first.url.as_deref(), Some(table_fixtures::PORTO_ALEGRE_URL));
        assert_eq!(first.value, 1_332_845.0);
        assert_eq!(first.date, mock_date(2022, 1, 1));
    }

    #[test]
    fn test_label_roles_fold() {
        let url = Cell::from("https://example.org/q1");
        let text = Cell::from("label");
        assert_eq!(
            assign_label_roles(Some(&[text.clone(), url.clone(), text.clone()][..]), 3),
            vec![ColumnRole::Name, ColumnRole::Url, ColumnRole::Category]
        );
        assert_eq!(
            assign_label_roles(Some(&[url.clone(), url][..]), 2),
            vec![ColumnRole::Url, ColumnRole::Name]
        );
        assert_eq!(
            assign_label_roles(Some(&[text.clone(), text.clone(), text][..]), 3),
            vec![ColumnRole::Name, ColumnRole::Category, ColumnRole::Category]
        );
        assert_eq!(assign_label_roles(None, 1), vec![ColumnRole::Name]);
    }

    #[test]
    fn test_only_url_label_is_missing_label() {
        let table = text_table(
            &["item", "value", "date"],
            &[&["http://www.wikidata.org/entity/Q1", "1", "2020"]],
        );
        assert_eq!(normalize(&table, &config()), Err(NormalizeError::LabelMissing));
    }

    #[test]
    fn test_second_category_column_overwrites_first() {
        let table = text_table(
            &["name", "region", "continent", "value", "date"],
            &[&["Chile", "Andes", "South America", "19", "2020"]],
        );
        let table = normalize(&table, &config()).unwrap();
        assert_eq!(table.rows()[0].category.as_deref(), Some("South America"));
        assert!(table.has_category());
        assert!(!table.has_url());
    }

    #[test]
    fn test_bad_date_column() {
        let table = text_table(
            &["name", "value", "date"],
            &[&["a", "1", "2020-01-01"], &["b", "2", "last tuesday"]],
        );
        assert_eq!(
            normalize(&table, &config()),
            Err(NormalizeError::DateColumn {
                row: 1,
                cell: "last tuesday".to_string()
            })
        );
    }

    #[test]
    fn test_bad_value_column() {
        let table = text_table(&["name", "value", "date"], &[&["a", "many", "2020"]]);
        assert!(matches!(
            normalize(&table, &config()),
            Err(NormalizeError::ValueColumn { row: 0, .. })
        ));
    }

    #[test]
    fn test_null_value_is_rejected() {
        let mut table = text_table(&["name", "value", "date"], &[]);
        table
            .rows
            .push(vec![Cell::from("a"), Cell::Null, Cell::from("2020")]);
        assert!(matches!(
            normalize(&table, &config()),
            Err(NormalizeError::ValueColumn { .. })
        ));
    }

    #[test]
    fn test_placeholder_rows_are_dropped_before_validation() {
        let table = text_table(
            &["item", "name", "value", "date"],
            &[
                &[
                    "http://www.wikidata.org/.well-known/genid/abc",
                    "ghost",
                    "not a number",
                    "never",
                ],
                &["http://www.wikidata.org/entity/Q1", "real", "3", "2021"],
            ],
        );
        let table = normalize(&table, &config()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].name, "real");
        assert!(table.has_url());
    }

    #[test]
    fn test_duplicates_keep_first() {
        let table = text_table(
            &["name", "value", "date"],
            &[
                &["a", "1", "2020-05-01"],
                &["a", "2", "2020-05-01T12:00:00Z"],
                &["a", "3", "2020-05-02"],
            ],
        );
        let table = normalize(&table, &config()).unwrap();
        let values: Vec<f64> = table.rows().iter().map(|row| row.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn test_elements_first_seen() {
        let table = text_table(
            &["name", "category", "value", "date"],
            &[
                &["b", "x", "1", "2020"],
                &["a", "y", "1", "2020"],
                &["b", "z", "1", "2021"],
            ],
        );
        let elements = normalize(&table, &config()).unwrap().elements();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].name, "b");
        assert_eq!(elements[0].category.as_deref(), Some("x"));
        assert_eq!(elements[1].name, "a");
        assert!(elements[1].url.is_none());
    }

    #[test]
    fn test_empty_table_normalizes() {
        let table = text_table(&["name", "value", "date"], &[]);
        let table = normalize(&table, &config()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.year_span(), 0);
    }
}
