//! Metric abstraction for revision-history analysis.
//!
//! A metric turns one entity's revision table into a time series. The set of
//! available metrics lives in a [`MetricRegistry`]; a dashboard activates an
//! ordered subset of it by index.

pub mod builtin;
pub mod engine;

use std::sync::Arc;

use crate::data::model::{RevisionTable, TimeSeries};
use crate::error::LoadError;

/// Trait for implementing analytical metrics over a revision table.
pub trait Metric: Send + Sync {
    /// Stable identifier, e.g. `edits`.
    fn id(&self) -> &str;

    /// Display label used as panel title.
    fn label(&self) -> &str;

    /// Compute the metric's series for one entity.
    fn compute(&self, table: &RevisionTable) -> anyhow::Result<TimeSeries>;
}

/// Ordered registry of available metrics.
pub struct MetricRegistry {
    metrics: Vec<Arc<dyn Metric>>,
}

impl MetricRegistry {
    /// Create a registry with the built-in metrics.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for metric in builtin::all() {
            registry.register(Arc::new(metric));
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            metrics: Vec::new(),
        }
    }

    /// Register a metric at the end of the registry.
    pub fn register(&mut self, metric: Arc<dyn Metric>) {
        self.metrics.push(metric);
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Metric>> {
        self.metrics.iter()
    }

    /// Pick the active metrics, in the order given.
    pub fn select(&self, indices: &[usize]) -> Result<Vec<Arc<dyn Metric>>, LoadError> {
        indices
            .iter()
            .map(|&index| {
                self.metrics
                    .get(index)
                    .cloned()
                    .ok_or(LoadError::UnknownMetric {
                        index,
                        available: self.metrics.len(),
                    })
            })
            .collect()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_order() {
        let registry = MetricRegistry::new();
        assert_eq!(registry.len(), 6);
        let ids: Vec<&str> = registry.iter().map(|m| m.id()).collect();
        assert_eq!(
            ids,
            vec!["edits", "users", "pages_new", "users_new", "edits_accum", "pages"]
        );
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let registry = MetricRegistry::new();
        let active = registry.select(&[1, 0]).unwrap();
        assert_eq!(active[0].id(), "users");
        assert_eq!(active[1].id(), "edits");
    }

    #[test]
    fn test_select_unknown_index() {
        let registry = MetricRegistry::new();
        let err = registry.select(&[0, 42]).err().unwrap();
        assert!(matches!(
            err,
            LoadError::UnknownMetric { index: 42, available: 6 }
        ));
    }
}
