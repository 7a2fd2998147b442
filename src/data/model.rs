use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

// ---------------------------------------------------------------------------
// CellValue – a single cell in a revision column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell of a revision table.
/// Metrics collect distinct values into `BTreeSet`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Revision – one row of an entity's event log
// ---------------------------------------------------------------------------

/// A single revision (one row of the source table).
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Unique row key (`revision_id`).
    pub id: i64,
    /// When the revision was saved (UTC).
    pub timestamp: DateTime<Utc>,
    /// Remaining columns: column_name → value.
    pub fields: BTreeMap<String, CellValue>,
}

impl Revision {
    /// First day of the calendar month this revision falls in.
    pub fn month(&self) -> NaiveDate {
        let date = self.timestamp.date_naive();
        date.with_day(1).unwrap_or(date)
    }

    pub fn field(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column).filter(|v| !v.is_null())
    }
}

// ---------------------------------------------------------------------------
// RevisionTable – the complete history of one entity
// ---------------------------------------------------------------------------

/// The full revision history of one entity, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionTable {
    /// Entity display name (the file stem it was loaded from).
    pub entity: String,
    /// All revisions, sorted by `(timestamp, id)`.
    pub revisions: Vec<Revision>,
    /// Column names as they appeared in the source, key and timestamp included.
    pub column_names: Vec<String>,
}

impl RevisionTable {
    /// Build a table, rejecting duplicate row keys.
    pub fn new(entity: &str, mut revisions: Vec<Revision>, column_names: Vec<String>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for rev in &revisions {
            if !seen.insert(rev.id) {
                bail!("duplicate revision_id {}", rev.id);
            }
        }
        revisions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        Ok(RevisionTable {
            entity: entity.to_string(),
            revisions,
            column_names,
        })
    }

    /// Number of revisions.
    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Fail unless the source table carried `column`.
    pub fn require_column(&self, column: &str) -> Result<()> {
        if !self.has_column(column) {
            bail!("column '{column}' not present in '{}'", self.entity);
        }
        Ok(())
    }

    /// Revisions grouped by calendar month, months in ascending order.
    /// Only months with at least one revision appear.
    pub fn by_month(&self) -> BTreeMap<NaiveDate, Vec<&Revision>> {
        let mut months: BTreeMap<NaiveDate, Vec<&Revision>> = BTreeMap::new();
        for rev in &self.revisions {
            months.entry(rev.month()).or_default().push(rev);
        }
        months
    }
}

// ---------------------------------------------------------------------------
// TimeSeries – output of one metric on one entity
// ---------------------------------------------------------------------------

/// An ordered sequence of `(period, value)` pairs.
///
/// A series whose metric failed carries the failure in `unavailable` and no points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    pub points: Vec<(NaiveDate, f64)>,
    pub unavailable: Option<String>,
}

impl TimeSeries {
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Self {
        TimeSeries {
            points,
            unavailable: None,
        }
    }

    /// Placeholder for a (metric, entity) cell whose computation failed.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        TimeSeries {
            points: Vec::new(),
            unavailable: Some(reason.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn periods(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(p, _)| *p)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }
}
