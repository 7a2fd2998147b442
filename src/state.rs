use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::config::Args;
use crate::data::loader::load_tables;
use crate::data::model::RevisionTable;
use crate::error::LoadError;
use crate::graph::{AxisMode, CurveMatrix, GraphCurve, Visibility, build_curves};
use crate::matrix::SeriesMatrix;
use crate::metrics::engine::{FailurePolicy, compute_metrics};
use crate::metrics::{Metric, MetricRegistry};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Which entities and metrics the user currently has selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub entities: BTreeSet<usize>,
    pub metrics: BTreeSet<usize>,
}

impl SelectionState {
    /// Everything selected.
    pub fn all(n_entities: usize, n_metrics: usize) -> Self {
        Self {
            entities: (0..n_entities).collect(),
            metrics: (0..n_metrics).collect(),
        }
    }
}

/// One rendered plot: a metric row with visibility applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    #[serde(skip)]
    pub metric: usize,
    pub title: String,
    pub curves: Vec<GraphCurve>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A loaded dashboard: series and curves built once, selection mutated
/// by the UI.
pub struct Session {
    /// Entity display names, column order of every matrix.
    pub entities: Vec<String>,
    /// Active metric labels, row order of every matrix.
    pub metric_labels: Vec<String>,
    pub axis: AxisMode,
    pub series: SeriesMatrix,
    curves: CurveMatrix,
    pub selection: SelectionState,
    /// Output of the last selection change.
    pub panels: Vec<Panel>,
    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Session {
    /// Full load phase: read tables, compute metrics, build curves.
    pub fn load(args: &Args, registry: &MetricRegistry) -> Result<Self, LoadError> {
        let metrics = registry.select(&args.metrics)?;
        let tables = load_tables(&args.data_dir, &args.entities)?;
        Self::from_tables(&tables, &metrics, args.axis_mode(), args.failure_policy())
    }

    pub fn from_tables(
        tables: &[RevisionTable],
        metrics: &[Arc<dyn Metric>],
        axis: AxisMode,
        policy: FailurePolicy,
    ) -> Result<Self, LoadError> {
        let by_entity = compute_metrics(tables, metrics, policy)?;
        let series = SeriesMatrix::from_entity_major(by_entity, metrics.len())?;

        let entities: Vec<String> = tables.iter().map(|t| t.entity.clone()).collect();
        let curves = build_curves(&series, axis, &entities)?;

        let metric_labels = metrics.iter().map(|m| m.label().to_string()).collect();
        let selection = SelectionState::all(entities.len(), metrics.len());

        info!(
            "Dashboard ready: {} entities x {} metrics",
            entities.len(),
            metrics.len()
        );

        let mut session = Session {
            entities,
            metric_labels,
            axis,
            series,
            curves,
            selection,
            panels: Vec::new(),
            status_message: None,
        };
        session.apply_selection();
        Ok(session)
    }

    pub fn curves(&self) -> &CurveMatrix {
        &self.curves
    }

    /// Replace the whole selection and rebuild the panels.
    ///
    /// Indices outside the loaded entities/metrics are ignored.
    pub fn on_selection_changed(&mut self, entities: &[usize], metrics: &[usize]) -> &[Panel] {
        self.selection = SelectionState {
            entities: in_range(entities, self.entities.len(), "entity"),
            metrics: in_range(metrics, self.metric_labels.len(), "metric"),
        };
        self.apply_selection();
        &self.panels
    }

    /// Recompute curve visibility in place, then the panel list.
    fn apply_selection(&mut self) {
        let selected = &self.selection.entities;
        for (_, entity, curve) in self.curves.cells_mut() {
            curve.visibility = if selected.contains(&entity) {
                Visibility::Shown
            } else {
                Visibility::LegendOnly
            };
        }

        // BTreeSet iterates in ascending order, i.e. configured metric order.
        self.panels = self
            .selection
            .metrics
            .iter()
            .filter_map(|&metric| {
                let title = self.metric_labels.get(metric)?;
                let curves = self.curves.row(metric)?;
                Some(Panel {
                    metric,
                    title: title.clone(),
                    curves: curves.to_vec(),
                })
            })
            .collect();
    }

    /// Toggle one entity in the selection.
    pub fn toggle_entity(&mut self, entity: usize) {
        let mut entities = self.selection.entities.clone();
        if !entities.remove(&entity) {
            entities.insert(entity);
        }
        self.set_entities(entities);
    }

    /// Toggle one metric in the selection.
    pub fn toggle_metric(&mut self, metric: usize) {
        let mut metrics = self.selection.metrics.clone();
        if !metrics.remove(&metric) {
            metrics.insert(metric);
        }
        self.set_metrics(metrics);
    }

    pub fn select_all_entities(&mut self) {
        self.set_entities((0..self.entities.len()).collect());
    }

    pub fn select_no_entities(&mut self) {
        self.set_entities(BTreeSet::new());
    }

    pub fn select_all_metrics(&mut self) {
        self.set_metrics((0..self.metric_labels.len()).collect());
    }

    pub fn select_no_metrics(&mut self) {
        self.set_metrics(BTreeSet::new());
    }

    fn set_entities(&mut self, entities: BTreeSet<usize>) {
        let metrics: Vec<usize> = self.selection.metrics.iter().copied().collect();
        let entities: Vec<usize> = entities.into_iter().collect();
        self.on_selection_changed(&entities, &metrics);
    }

    fn set_metrics(&mut self, metrics: BTreeSet<usize>) {
        let entities: Vec<usize> = self.selection.entities.iter().copied().collect();
        let metrics: Vec<usize> = metrics.into_iter().collect();
        self.on_selection_changed(&entities, &metrics);
    }

    /// Write the current panel list as pretty JSON.
    pub fn export_panels(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.panels).context("serializing panels")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Exported {} panels to {}", self.panels.len(), path.display());
        Ok(())
    }
}

fn in_range(indices: &[usize], len: usize, what: &str) -> BTreeSet<usize> {
    indices
        .iter()
        .copied()
        .filter(|&i| {
            let ok = i < len;
            if !ok {
                warn!("Ignoring out-of-range {what} index {i} (have {len})");
            }
            ok
        })
        .collect()
}
