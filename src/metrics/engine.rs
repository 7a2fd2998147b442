use std::sync::Arc;

use log::{debug, info, warn};

use super::Metric;
use crate::data::model::{RevisionTable, TimeSeries};
use crate::error::LoadError;

/// What to do when a metric fails on one entity's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Replace the failing cell with an unavailable placeholder and keep going.
    #[default]
    Isolate,
    /// Abort the whole load.
    Abort,
}

/// Run every metric on every table.
///
/// Output is entity-major: `result[entity][metric]`, both in input order.
pub fn compute_metrics(
    tables: &[RevisionTable],
    metrics: &[Arc<dyn Metric>],
    policy: FailurePolicy,
) -> Result<Vec<Vec<TimeSeries>>, LoadError> {
    let mut by_entity = Vec::with_capacity(tables.len());

    for (entity_idx, table) in tables.iter().enumerate() {
        info!(
            "Computing {} metrics for {} ({}/{})",
            metrics.len(),
            table.entity,
            entity_idx + 1,
            tables.len()
        );
        let row = metrics
            .iter()
            .map(|metric| compute_cell(metric.as_ref(), table, policy))
            .collect::<Result<Vec<_>, _>>()?;
        by_entity.push(row);
    }

    Ok(by_entity)
}

fn compute_cell(
    metric: &dyn Metric,
    table: &RevisionTable,
    policy: FailurePolicy,
) -> Result<TimeSeries, LoadError> {
    match metric.compute(table) {
        Ok(series) => {
            debug!(
                "{} / {}: {} periods",
                metric.id(),
                table.entity,
                series.len()
            );
            Ok(series)
        }
        Err(e) => match policy {
            FailurePolicy::Isolate => {
                warn!(
                    "Metric {} unavailable for {}: {e:#}",
                    metric.id(),
                    table.entity
                );
                Ok(TimeSeries::unavailable(format!("{e:#}")))
            }
            FailurePolicy::Abort => Err(LoadError::MetricCompute {
                metric: metric.id().to_string(),
                entity: table.entity.clone(),
                reason: format!("{e:#}"),
            }),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::tests::{rev, table};
    use crate::metrics::MetricRegistry;

    /// A metric that always fails.
    pub(crate) struct Broken;

    impl Metric for Broken {
        fn id(&self) -> &str {
            "broken"
        }

        fn label(&self) -> &str {
            "Broken"
        }

        fn compute(&self, _table: &RevisionTable) -> anyhow::Result<TimeSeries> {
            anyhow::bail!("boom")
        }
    }

    fn tables() -> Vec<RevisionTable> {
        vec![
            table("a", vec![rev(1, "2017-01-01T00:00:00Z", 1, Some(1))]),
            table(
                "b",
                vec![
                    rev(1, "2016-05-01T00:00:00Z", 1, Some(1)),
                    rev(2, "2016-06-01T00:00:00Z", 2, Some(2)),
                ],
            ),
            table("c", Vec::new()),
        ]
    }

    #[test]
    fn test_entity_major_shape_and_cells() {
        let tables = tables();
        let metrics = MetricRegistry::new().select(&[0, 1]).unwrap();
        let out = compute_metrics(&tables, &metrics, FailurePolicy::Abort).unwrap();

        assert_eq!(out.len(), 3);
        for (e, row) in out.iter().enumerate() {
            assert_eq!(row.len(), 2);
            for (m, cell) in row.iter().enumerate() {
                assert_eq!(*cell, metrics[m].compute(&tables[e]).unwrap());
            }
        }
    }

    #[test]
    fn test_isolate_keeps_other_cells() {
        let tables = tables();
        let mut metrics = MetricRegistry::new().select(&[0]).unwrap();
        metrics.push(Arc::new(Broken));

        let out = compute_metrics(&tables, &metrics, FailurePolicy::Isolate).unwrap();
        assert_eq!(out[1][0].len(), 2);
        assert_eq!(out[1][1].unavailable.as_deref(), Some("boom"));
        assert!(out[1][1].is_empty());
    }

    #[test]
    fn test_abort_names_metric_and_entity() {
        let tables = tables();
        let metrics: Vec<Arc<dyn Metric>> = vec![Arc::new(Broken)];
        let err = compute_metrics(&tables, &metrics, FailurePolicy::Abort).unwrap_err();
        match err {
            LoadError::MetricCompute { metric, entity, .. } => {
                assert_eq!(metric, "broken");
                assert_eq!(entity, "a");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_no_metrics() {
        let out = compute_metrics(&tables(), &[], FailurePolicy::Isolate).unwrap();
        assert_eq!(out, vec![Vec::<TimeSeries>::new(); 3]);
    }
}
