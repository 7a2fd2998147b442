use crate::data::model::TimeSeries;
use crate::error::LoadError;

/// Metric-major grid: `rows[metric][entity]`.
///
/// Every row has exactly `n_entities` cells; this is checked on construction
/// and preserved by every method.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: Vec<Vec<T>>,
    n_entities: usize,
}

/// Engine output arranged for display grouping.
pub type SeriesMatrix = Matrix<TimeSeries>;

impl<T> Matrix<T> {
    /// Transpose entity-major `[entity][metric]` engine output.
    ///
    /// Every entity must have produced exactly `n_metrics` results.
    pub fn from_entity_major(by_entity: Vec<Vec<T>>, n_metrics: usize) -> Result<Self, LoadError> {
        let n_entities = by_entity.len();
        for (entity_idx, row) in by_entity.iter().enumerate() {
            if row.len() != n_metrics {
                return Err(LoadError::ShapeMismatch {
                    context: format!("metric results of entity {entity_idx}"),
                    expected: n_metrics,
                    actual: row.len(),
                });
            }
        }
        Ok(Matrix {
            rows: transpose(by_entity, n_metrics),
            n_entities,
        })
    }

    /// Back to entity-major `[entity][metric]`.
    #[cfg(test)]
    pub fn into_entity_major(self) -> Vec<Vec<T>> {
        transpose(self.rows, self.n_entities)
    }

    pub fn n_metrics(&self) -> usize {
        self.rows.len()
    }

    pub fn n_entities(&self) -> usize {
        self.n_entities
    }

    #[cfg(test)]
    pub fn get(&self, metric: usize, entity: usize) -> Option<&T> {
        self.rows.get(metric)?.get(entity)
    }

    /// All cells of one metric, in entity order.
    pub fn row(&self, metric: usize) -> Option<&[T]> {
        self.rows.get(metric).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Mutable access to every cell with its `(metric, entity)` position.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        self.rows.iter_mut().enumerate().flat_map(|(m, row)| {
            row.iter_mut().enumerate().map(move |(e, cell)| (m, e, cell))
        })
    }

    /// Same-shaped matrix built cell by cell.
    pub fn map<U>(&self, mut f: impl FnMut(usize, usize, &T) -> U) -> Matrix<U> {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(m, row)| row.iter().enumerate().map(|(e, cell)| f(m, e, cell)).collect())
            .collect();
        Matrix {
            rows,
            n_entities: self.n_entities,
        }
    }
}

/// `rows` must all have length `width`; returns `width` rows of `rows.len()` cells.
fn transpose<T>(rows: Vec<Vec<T>>, width: usize) -> Vec<Vec<T>> {
    let height = rows.len();
    let mut out: Vec<Vec<T>> = (0..width).map(|_| Vec::with_capacity(height)).collect();
    for row in rows {
        for (col, cell) in row.into_iter().enumerate() {
            out[col].push(cell);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_major(n_entities: usize, n_metrics: usize) -> Vec<Vec<(usize, usize)>> {
        (0..n_entities)
            .map(|e| (0..n_metrics).map(|m| (m, e)).collect())
            .collect()
    }

    #[test]
    fn test_transpose_dimensions_and_cells() {
        for (n, m) in [(0, 0), (0, 3), (3, 0), (1, 1), (2, 2), (4, 3)] {
            let matrix = Matrix::from_entity_major(entity_major(n, m), m).unwrap();
            assert_eq!(matrix.n_metrics(), m);
            assert_eq!(matrix.n_entities(), n);
            for mi in 0..m {
                for ei in 0..n {
                    assert_eq!(matrix.get(mi, ei), Some(&(mi, ei)));
                }
            }
        }
    }

    #[test]
    fn test_transpose_is_bijective() {
        for (n, m) in [(0, 2), (3, 0), (2, 5), (5, 2)] {
            let original = entity_major(n, m);
            let matrix = Matrix::from_entity_major(original.clone(), m).unwrap();
            assert_eq!(matrix.into_entity_major(), original);
        }
    }

    #[test]
    fn test_ragged_engine_output_rejected() {
        let ragged = vec![vec![1, 2], vec![3]];
        let err = Matrix::from_entity_major(ragged, 2).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ShapeMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_wrong_metric_count_rejected() {
        let err = Matrix::from_entity_major(vec![vec![1, 2, 3]], 2).unwrap_err();
        assert!(matches!(err, LoadError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_map_and_cells_mut_keep_positions() {
        let mut matrix = Matrix::from_entity_major(entity_major(2, 3), 3).unwrap();
        let mapped = matrix.map(|m, e, cell| {
            assert_eq!(*cell, (m, e));
            m * 10 + e
        });
        assert_eq!(mapped.row(2), Some(&[20, 21][..]));

        for (m, e, cell) in matrix.cells_mut() {
            *cell = (e, m);
        }
        assert_eq!(matrix.get(1, 0), Some(&(0, 1)));
    }
}
