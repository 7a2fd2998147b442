use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::Serialize;

use crate::data::model::TimeSeries;
use crate::error::LoadError;
use crate::matrix::{Matrix, SeriesMatrix};

// ---------------------------------------------------------------------------
// Axis policy
// ---------------------------------------------------------------------------

/// How series of different entities are aligned on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    /// x = 0, 1, 2, … observed periods since the entity's first activity.
    #[default]
    Relative,
    /// x = the period itself, as days since 0001-01-01.
    Absolute,
}

impl AxisMode {
    pub fn axis_label(self) -> &'static str {
        match self {
            AxisMode::Relative => "Months since first edit",
            AxisMode::Absolute => "Month",
        }
    }
}

/// Absolute-mode x coordinate of a period.
pub fn period_to_x(period: NaiveDate) -> f64 {
    period.num_days_from_ce() as f64
}

/// Inverse of [`period_to_x`], for axis labels.
pub fn x_to_period(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x < i32::MIN as f64 || x > i32::MAX as f64 {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Whether a curve is plotted or only listed in the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Shown,
    LegendOnly,
}

/// One plottable line: a single (metric, entity) series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Entity display name.
    pub label: String,
    pub visibility: Visibility,
    /// Set when the metric could not be computed for this entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
}

impl GraphCurve {
    pub fn from_series(series: &TimeSeries, axis: AxisMode, label: &str) -> Self {
        let x = match axis {
            AxisMode::Relative => (0..series.len()).map(|i| i as f64).collect(),
            AxisMode::Absolute => series.periods().map(period_to_x).collect(),
        };
        GraphCurve {
            x,
            y: series.values().collect(),
            label: label.to_string(),
            visibility: Visibility::Shown,
            unavailable: series.unavailable.clone(),
        }
    }

    pub fn is_shown(&self) -> bool {
        self.visibility == Visibility::Shown
    }
}

/// Curves laid out like the series they came from: `[metric][entity]`.
pub type CurveMatrix = Matrix<GraphCurve>;

/// Turn every series into a curve; `entity_names[e]` labels column `e`.
pub fn build_curves(
    series: &SeriesMatrix,
    axis: AxisMode,
    entity_names: &[String],
) -> Result<CurveMatrix, LoadError> {
    if entity_names.len() != series.n_entities() {
        return Err(LoadError::ShapeMismatch {
            context: "entity display names".to_string(),
            expected: series.n_entities(),
            actual: entity_names.len(),
        });
    }

    let curves = series.map(|_, entity, s| GraphCurve::from_series(s, axis, &entity_names[entity]));
    debug!(
        "Built {}x{} curves ({axis:?} axis)",
        curves.n_metrics(),
        curves.n_entities()
    );
    Ok(curves)
}
