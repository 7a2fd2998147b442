use thiserror::Error;

/// Fatal errors raised while building a dashboard session.
///
/// Everything here aborts the load phase; selection handling never fails.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A revision table is missing, malformed, or lacks a required column.
    #[error("data format error in '{entity}': {reason}")]
    DataFormat { entity: String, reason: String },

    /// Engine or curve output disagrees with the configured dimensions.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A metric failed on an entity's table while running in strict mode.
    #[error("metric '{metric}' failed on '{entity}': {reason}")]
    MetricCompute {
        metric: String,
        entity: String,
        reason: String,
    },

    /// A configured metric index is not present in the registry.
    #[error("unknown metric index {index} (registry has {available} metrics)")]
    UnknownMetric { index: usize, available: usize },
}

impl LoadError {
    pub fn data_format(entity: &str, err: impl std::fmt::Display) -> Self {
        LoadError::DataFormat {
            entity: entity.to_string(),
            reason: err.to_string(),
        }
    }
}
