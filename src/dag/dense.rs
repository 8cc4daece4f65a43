//! Dense matrix values.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::estim::DataCharacteristics;

use super::node::format_float;

/// Row-major dense matrix.
///
/// Used for literal inputs embedded in scripts and for matrix results
/// returned by the engine.
///
/// Deserialization goes through [`DenseMatrix::new`], so a payload whose value
/// count disagrees with its shape is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDenseMatrix")]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawDenseMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl TryFrom<RawDenseMatrix> for DenseMatrix {
    type Error = ValidationError;

    fn try_from(raw: RawDenseMatrix) -> Result<Self, Self::Error> {
        Self::new(raw.rows, raw.cols, raw.values)
    }
}

impl DenseMatrix {
    /// Creates a matrix, checking that `values` holds exactly `rows * cols` cells.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, ValidationError> {
        let expected = rows.saturating_mul(cols);
        if values.len() != expected {
            return Err(ValidationError::DenseValueCount {
                rows,
                cols,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Creates a single-column matrix.
    #[must_use]
    pub fn column(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            values,
        }
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Cell values in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Cell `(r, c)`, if in range.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> Option<f64> {
        if r >= self.rows || c >= self.cols {
            return None;
        }
        self.values.get(r * self.cols + c).copied()
    }

    /// Iterates rows as slices.
    pub fn row_slices(&self) -> impl Iterator<Item = &[f64]> {
        // chunks() panics on 0; a 0-column matrix has no cells anyway
        self.values.chunks(self.cols.max(1))
    }

    /// Number of non-zero cells.
    #[must_use]
    pub fn nnz(&self) -> u64 {
        self.values.iter().filter(|v| **v != 0.0).count() as u64
    }

    /// Exact metadata.
    #[must_use]
    pub fn characteristics(&self) -> DataCharacteristics {
        DataCharacteristics::exact(self.rows as u64, self.cols as u64, self.nnz())
    }

    /// Renders the matrix as a `matrix("...", rows=r, cols=c)` expression.
    #[must_use]
    pub fn to_dml(&self) -> String {
        let cells: Vec<String> = self.values.iter().map(|v| format_float(*v)).collect();
        format!(
            "matrix(\"{}\", rows={}, cols={})",
            cells.join(" "),
            self.rows,
            self.cols
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_count_checked() {
        let err = DenseMatrix::new(2, 2, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DenseValueCount {
                rows: 2,
                cols: 2,
                expected: 4,
                actual: 3,
            }
        );
    }

    #[test]
    fn test_accessors() {
        let m = DenseMatrix::new(2, 3, vec![1.0, 0.0, 2.0, 0.0, 0.0, 3.0]).unwrap();
        assert_eq!(m.get(1, 2), Some(3.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row_slices().count(), 2);
        assert_eq!(m.characteristics(), DataCharacteristics::exact(2, 3, 3));
    }

    #[test]
    fn test_dml_rendering() {
        let m = DenseMatrix::new(2, 2, vec![1.0, 2.5, 0.0, -4.0]).unwrap();
        assert_eq!(m.to_dml(), "matrix(\"1.0 2.5 0.0 -4.0\", rows=2, cols=2)");
    }

    #[test]
    fn test_column() {
        let v = DenseMatrix::column(vec![1.0, 0.0, 1.0]);
        assert_eq!((v.rows(), v.cols()), (3, 1));
    }

    #[test]
    fn test_deserialize_checks_value_count() {
        let m: DenseMatrix =
            serde_json::from_str(r#"{"rows":1,"cols":2,"values":[1.0,0.0]}"#).unwrap();
        assert_eq!(m, DenseMatrix::new(1, 2, vec![1.0, 0.0]).unwrap());

        let err = serde_json::from_str::<DenseMatrix>(r#"{"rows":1,"cols":1,"values":[1.0,1.0,1.0]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("requires 1 values, got 3"), "{err}");
    }

    #[test]
    fn test_serialize_roundtrip_keeps_fields() {
        let m = DenseMatrix::new(2, 1, vec![3.0, 4.0]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"rows":2,"cols":1,"values":[3.0,4.0]}"#);
    }
}
