//! Monthly metrics over wiki revision histories.
//!
//! Every metric emits one point per calendar month that has at least one
//! revision. Months without activity are not filled in, so all metrics of an
//! entity share the same periods.

use std::collections::BTreeSet;

use anyhow::Result;

use super::Metric;
use crate::data::model::{CellValue, RevisionTable, TimeSeries};

pub const PAGE_COLUMN: &str = "page_id";
pub const CONTRIBUTOR_COLUMN: &str = "contributor_id";

type ComputeFn = fn(&RevisionTable) -> Result<TimeSeries>;

/// A metric backed by a plain function.
pub struct BuiltinMetric {
    id: &'static str,
    label: &'static str,
    compute: ComputeFn,
}

impl Metric for BuiltinMetric {
    fn id(&self) -> &str {
        self.id
    }

    fn label(&self) -> &str {
        self.label
    }

    fn compute(&self, table: &RevisionTable) -> Result<TimeSeries> {
        (self.compute)(table)
    }
}

/// Built-in metrics in registry order.
pub fn all() -> Vec<BuiltinMetric> {
    vec![
        BuiltinMetric {
            id: "edits",
            label: "Edits per month",
            compute: edits_per_month,
        },
        BuiltinMetric {
            id: "users",
            label: "Active editors per month",
            compute: editors_per_month,
        },
        BuiltinMetric {
            id: "pages_new",
            label: "New pages per month",
            compute: new_pages_per_month,
        },
        BuiltinMetric {
            id: "users_new",
            label: "New editors per month",
            compute: new_editors_per_month,
        },
        BuiltinMetric {
            id: "edits_accum",
            label: "Cumulative edits",
            compute: cumulative_edits,
        },
        BuiltinMetric {
            id: "pages",
            label: "Cumulative pages",
            compute: cumulative_pages,
        },
    ]
}

fn edits_per_month(table: &RevisionTable) -> Result<TimeSeries> {
    let points = table
        .by_month()
        .into_iter()
        .map(|(month, revs)| (month, revs.len() as f64))
        .collect();
    Ok(TimeSeries::new(points))
}

/// Distinct non-null contributors per month.
fn editors_per_month(table: &RevisionTable) -> Result<TimeSeries> {
    table.require_column(CONTRIBUTOR_COLUMN)?;
    let points = table
        .by_month()
        .into_iter()
        .map(|(month, revs)| {
            let editors: BTreeSet<&CellValue> =
                revs.iter().filter_map(|r| r.field(CONTRIBUTOR_COLUMN)).collect();
            (month, editors.len() as f64)
        })
        .collect();
    Ok(TimeSeries::new(points))
}

/// Per month, how many values of `column` appear for the first time.
fn first_appearances(table: &RevisionTable, column: &str) -> Result<TimeSeries> {
    table.require_column(column)?;
    let mut seen: BTreeSet<&CellValue> = BTreeSet::new();
    let points = table
        .by_month()
        .into_iter()
        .map(|(month, revs)| {
            let fresh = revs
                .iter()
                .filter_map(|r| r.field(column))
                .filter(|v| seen.insert(*v))
                .count();
            (month, fresh as f64)
        })
        .collect();
    Ok(TimeSeries::new(points))
}

fn new_pages_per_month(table: &RevisionTable) -> Result<TimeSeries> {
    first_appearances(table, PAGE_COLUMN)
}

fn new_editors_per_month(table: &RevisionTable) -> Result<TimeSeries> {
    first_appearances(table, CONTRIBUTOR_COLUMN)
}

fn running_total(series: TimeSeries) -> TimeSeries {
    let mut total = 0.0;
    let points = series
        .points
        .into_iter()
        .map(|(month, v)| {
            total += v;
            (month, total)
        })
        .collect();
    TimeSeries::new(points)
}

fn cumulative_edits(table: &RevisionTable) -> Result<TimeSeries> {
    edits_per_month(table).map(running_total)
}

fn cumulative_pages(table: &RevisionTable) -> Result<TimeSeries> {
    new_pages_per_month(table).map(running_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{rev, table};
    use chrono::NaiveDate;

    fn sample() -> RevisionTable {
        table(
            "w",
            vec![
                rev(1, "2017-01-03T00:00:00Z", 100, Some(1)),
                rev(2, "2017-01-04T00:00:00Z", 100, Some(2)),
                rev(3, "2017-01-05T00:00:00Z", 101, Some(1)),
                rev(4, "2017-03-01T00:00:00Z", 100, None),
                rev(5, "2017-03-02T00:00:00Z", 102, Some(3)),
            ],
        )
    }

    fn values(series: &TimeSeries) -> Vec<f64> {
        series.values().collect()
    }

    #[test]
    fn test_edits_per_month_skips_idle_months() {
        let s = edits_per_month(&sample()).unwrap();
        let periods: Vec<NaiveDate> = s.periods().collect();
        assert_eq!(
            periods,
            vec![
                NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2017, 3, 1).unwrap(),
            ]
        );
        assert_eq!(values(&s), vec![3.0, 2.0]);
    }

    #[test]
    fn test_editors_ignore_anonymous() {
        let s = editors_per_month(&sample()).unwrap();
        assert_eq!(values(&s), vec![2.0, 1.0]);
    }

    #[test]
    fn test_new_pages_and_editors() {
        assert_eq!(values(&new_pages_per_month(&sample()).unwrap()), vec![2.0, 1.0]);
        assert_eq!(values(&new_editors_per_month(&sample()).unwrap()), vec![2.0, 1.0]);
    }

    #[test]
    fn test_cumulative() {
        assert_eq!(values(&cumulative_edits(&sample()).unwrap()), vec![3.0, 5.0]);
        assert_eq!(values(&cumulative_pages(&sample()).unwrap()), vec![2.0, 3.0]);
    }

    #[test]
    fn test_missing_column_fails() {
        let t = RevisionTable::new(
            "bare",
            Vec::new(),
            vec!["revision_id".to_string(), "timestamp".to_string()],
        )
        .unwrap();
        let err = editors_per_month(&t).unwrap_err();
        assert!(err.to_string().contains("contributor_id"));
        assert!(edits_per_month(&t).unwrap().is_empty());
    }
}
