//! Recovery and removal-factor reference tables.
//!
//! Rows are keyed by exact string match on unit process and case study. A
//! value is either a fixed fraction or the `"calculated"` sentinel, which
//! hands the quantity to the external solver.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wt_core::{Real, ensure_fraction};
use wt_project::DEFAULT_CASE_STUDY;

const CALCULATED: &str = "calculated";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Unrecognised table value: {text:?}")]
    InvalidValue { text: String },

    #[error("Table fraction out of range: {value} (expected 0..=1)")]
    FractionOutOfRange { value: Real },

    #[error("Duplicate table row: {key}")]
    DuplicateRow { key: String },
}

/// A table cell: a fixed fraction or "left to the solver".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawValue", into = "RawValue")]
pub enum TableValue {
    Fixed(Real),
    Calculated,
}

impl TableValue {
    /// A fixed fraction; rejects values outside `[0, 1]`.
    pub fn fixed(value: Real) -> Result<Self, TableError> {
        ensure_fraction(value, "table value")
            .map(TableValue::Fixed)
            .map_err(|_| TableError::FractionOutOfRange { value })
    }

    pub fn as_fixed(self) -> Option<Real> {
        match self {
            TableValue::Fixed(v) => Some(v),
            TableValue::Calculated => None,
        }
    }
}

impl FromStr for TableValue {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(CALCULATED) {
            return Ok(TableValue::Calculated);
        }
        let value: Real = s.parse().map_err(|_| TableError::InvalidValue {
            text: s.to_string(),
        })?;
        TableValue::fixed(value)
    }
}

impl fmt::Display for TableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableValue::Fixed(v) => write!(f, "{v}"),
            TableValue::Calculated => f.write_str(CALCULATED),
        }
    }
}

/// Wire form: tables mix numbers and the sentinel string in one column.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(Real),
    Text(String),
}

impl TryFrom<RawValue> for TableValue {
    type Error = TableError;

    fn try_from(raw: RawValue) -> Result<Self, Self::Error> {
        match raw {
            RawValue::Number(v) => TableValue::fixed(v),
            RawValue::Text(s) => s.parse(),
        }
    }
}

impl From<TableValue> for RawValue {
    fn from(value: TableValue) -> Self {
        match value {
            TableValue::Fixed(v) => RawValue::Number(v),
            TableValue::Calculated => RawValue::Text(CALCULATED.to_string()),
        }
    }
}

/// Which row satisfied a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    CaseStudy,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub value: TableValue,
    pub source: RowSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRow {
    pub unit_process: String,
    pub case_study: String,
    pub recovery: TableValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalRow {
    pub unit_process: String,
    pub case_study: String,
    pub constituent: String,
    pub removal_fraction: TableValue,
}

/// `(unit_process, case_study) -> recovery`.
#[derive(Debug, Clone, Default)]
pub struct RecoveryTable {
    rows: HashMap<(String, String), TableValue>,
}

impl RecoveryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = RecoveryRow>) -> Result<Self, TableError> {
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, row: RecoveryRow) -> Result<(), TableError> {
        let key = (row.unit_process, row.case_study);
        if self.rows.contains_key(&key) {
            return Err(TableError::DuplicateRow {
                key: format!("{}/{}", key.0, key.1),
            });
        }
        self.rows.insert(key, row.recovery);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact row for the case study, else the `"default"` row.
    pub fn lookup(&self, unit_process: &str, case_study: &str) -> Option<Hit> {
        let get = |case: &str| {
            self.rows
                .get(&(unit_process.to_string(), case.to_string()))
                .copied()
        };
        with_fallback(case_study, get)
    }
}

/// `(unit_process, case_study, constituent) -> removal fraction`.
#[derive(Debug, Clone, Default)]
pub struct RemovalTable {
    rows: HashMap<(String, String, String), TableValue>,
}

impl RemovalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = RemovalRow>) -> Result<Self, TableError> {
        let mut table = Self::new();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, row: RemovalRow) -> Result<(), TableError> {
        let key = (row.unit_process, row.case_study, row.constituent);
        if self.rows.contains_key(&key) {
            return Err(TableError::DuplicateRow {
                key: format!("{}/{}/{}", key.0, key.1, key.2),
            });
        }
        self.rows.insert(key, row.removal_fraction);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact row for the case study, else the `"default"` row.
    pub fn lookup(&self, unit_process: &str, case_study: &str, constituent: &str) -> Option<Hit> {
        let get = |case: &str| {
            self.rows
                .get(&(
                    unit_process.to_string(),
                    case.to_string(),
                    constituent.to_string(),
                ))
                .copied()
        };
        with_fallback(case_study, get)
    }
}

fn with_fallback(case_study: &str, get: impl Fn(&str) -> Option<TableValue>) -> Option<Hit> {
    if let Some(value) = get(case_study) {
        return Some(Hit {
            value,
            source: RowSource::CaseStudy,
        });
    }
    if case_study == DEFAULT_CASE_STUDY {
        return None;
    }
    get(DEFAULT_CASE_STUDY).map(|value| Hit {
        value,
        source: RowSource::Default,
    })
}

/// Both reference tables a train build reads from.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub recovery: RecoveryTable,
    pub removal: RemovalTable,
}

impl ReferenceTables {
    pub fn new(recovery: RecoveryTable, removal: RemovalTable) -> Self {
        Self { recovery, removal }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recovery(unit: &str, case: &str, value: TableValue) -> RecoveryRow {
        RecoveryRow {
            unit_process: unit.into(),
            case_study: case.into(),
            recovery: value,
        }
    }

    #[test]
    fn parse_sentinel_and_numbers() {
        assert_eq!("calculated".parse::<TableValue>(), Ok(TableValue::Calculated));
        assert_eq!(" Calculated ".parse::<TableValue>(), Ok(TableValue::Calculated));
        assert_eq!("0.25".parse::<TableValue>(), Ok(TableValue::Fixed(0.25)));
        assert!(matches!(
            "1.5".parse::<TableValue>(),
            Err(TableError::FractionOutOfRange { .. })
        ));
        assert!(matches!(
            "n/a".parse::<TableValue>(),
            Err(TableError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rows_deserialize_from_mixed_column() {
        let json = r#"[
            {"unit_process": "ro_deep", "case_study": "default", "recovery": 0.5},
            {"unit_process": "evaporation_pond", "case_study": "default", "recovery": "calculated"}
        ]"#;
        let rows: Vec<RecoveryRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].recovery, TableValue::Fixed(0.5));
        assert_eq!(rows[1].recovery, TableValue::Calculated);
    }

    #[test]
    fn out_of_range_row_rejected_on_deserialize() {
        let json = r#"{"unit_process": "x", "case_study": "default", "recovery": 2.0}"#;
        assert!(serde_json::from_str::<RecoveryRow>(json).is_err());
    }

    #[test]
    fn lookup_prefers_case_study_then_default() {
        let table = RecoveryTable::from_rows([
            recovery("mf", "default", TableValue::Fixed(0.9)),
            recovery("mf", "plantX", TableValue::Fixed(0.95)),
        ])
        .unwrap();

        let exact = table.lookup("mf", "plantX").unwrap();
        assert_eq!(exact.value, TableValue::Fixed(0.95));
        assert_eq!(exact.source, RowSource::CaseStudy);

        let fallback = table.lookup("mf", "plantY").unwrap();
        assert_eq!(fallback.value, TableValue::Fixed(0.9));
        assert_eq!(fallback.source, RowSource::Default);

        assert!(table.lookup("uv", "plantX").is_none());
    }

    #[test]
    fn default_case_study_hits_are_exact() {
        let table =
            RecoveryTable::from_rows([recovery("mf", "default", TableValue::Fixed(0.9))]).unwrap();
        assert_eq!(
            table.lookup("mf", "default").unwrap().source,
            RowSource::CaseStudy
        );
    }

    #[test]
    fn duplicate_rows_rejected() {
        let err = RecoveryTable::from_rows([
            recovery("mf", "default", TableValue::Fixed(0.9)),
            recovery("mf", "default", TableValue::Calculated),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateRow {
                key: "mf/default".into()
            }
        );
    }

    #[test]
    fn removal_lookup_is_per_constituent() {
        let table = RemovalTable::from_rows([RemovalRow {
            unit_process: "mf".into(),
            case_study: "default".into(),
            constituent: "arsenic".into(),
            removal_fraction: TableValue::Fixed(0.3),
        }])
        .unwrap();
        assert!(table.lookup("mf", "plantX", "arsenic").is_some());
        assert!(table.lookup("mf", "plantX", "boron").is_none());
        assert_eq!(table.len(), 1);
    }
}
