//! Row-major helpers shared by the dense matrix encodings.
//!
//! Problem files store matrices as nested JSON arrays; these helpers convert
//! between that form and `ndarray` while checking shape and finiteness.

use ndarray::Array2;

use crate::error::{ModelError, ModelResult};

/// Convert nested rows into a 2-D array, rejecting ragged input.
pub(crate) fn rows_to_array(rows: &[Vec<f64>]) -> ModelResult<Array2<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(n_rows * n_cols);
    for row in rows {
        if row.len() != n_cols {
            return Err(ModelError::DimensionMismatch {
                expected: n_cols,
                actual: row.len(),
            });
        }
        data.extend_from_slice(row);
    }
    Array2::from_shape_vec((n_rows, n_cols), data)
        .map_err(|e| ModelError::InvalidProblem(e.to_string()))
}

/// Convert a 2-D array into nested rows.
pub(crate) fn array_to_rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|r| r.to_vec()).collect()
}

/// Fail if any entry is NaN or infinite.
pub(crate) fn ensure_finite<'a>(
    values: impl IntoIterator<Item = &'a f64>,
    what: &str,
) -> ModelResult<()> {
    if values.into_iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ModelError::NonFinite(format!("{what} contains NaN or infinity")))
    }
}

/// Fail unless the matrix is square.
pub(crate) fn ensure_square(matrix: &Array2<f64>) -> ModelResult<usize> {
    let (rows, cols) = matrix.dim();
    if rows == cols {
        Ok(rows)
    } else {
        Err(ModelError::NotSquare { rows, cols })
    }
}

/// `(M + Mᵀ) / 2`.
pub(crate) fn symmetrize(matrix: &Array2<f64>) -> Array2<f64> {
    (matrix + &matrix.t()) * 0.5
}
