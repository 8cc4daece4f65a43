//! Exact non-zero structure of matrix products via boolean matrix multiply.
//!
//! Rows are packed into 64-bit words and aligned to word boundaries, so the
//! product reduces to OR-ing rows of the right operand into output rows.

use crate::dag::DenseMatrix;

use super::{DataCharacteristics, EstimError, OpCode};

const WORD_BITS: usize = 64;

/// Row-major boolean matrix recording which cells are non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitsetMatrix {
    rows: usize,
    cols: usize,
    row_words: usize,
    data: Vec<u64>,
    nnz: u64,
}

impl BitsetMatrix {
    /// Creates an all-zero boolean matrix.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        let row_words = cols.div_ceil(WORD_BITS);
        Self {
            rows,
            cols,
            row_words,
            data: vec![0; rows * row_words],
            nnz: 0,
        }
    }

    /// Builds the non-zero pattern of a dense matrix.
    #[must_use]
    pub fn from_dense(matrix: &DenseMatrix) -> Self {
        let mut out = Self::new(matrix.rows(), matrix.cols());
        for (i, row) in matrix.row_slices().take(matrix.rows()).enumerate() {
            for (j, v) in row.iter().enumerate() {
                if *v != 0.0 {
                    out.set(i, j);
                }
            }
        }
        out.nnz = matrix.nnz();
        out
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

    /// Number of set cells.
    #[must_use]
    pub const fn nnz(&self) -> u64 {
        self.nnz
    }

    /// Returns whether cell `(r, c)` is set. Out-of-range cells are unset.
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> bool {
        if r >= self.rows || c >= self.cols {
            return false;
        }
        self.data[r * self.row_words + c / WORD_BITS] & (1u64 << (c % WORD_BITS)) != 0
    }

    fn set(&mut self, r: usize, c: usize) {
        self.data[r * self.row_words + c / WORD_BITS] |= 1u64 << (c % WORD_BITS);
    }

    /// Shape and non-zero count as metadata.
    #[must_use]
    pub fn characteristics(&self) -> DataCharacteristics {
        DataCharacteristics::exact(self.rows as u64, self.cols as u64, self.nnz)
    }

    /// Boolean product `self x other`.
    pub fn mat_mult(&self, other: &Self) -> Result<Self, EstimError> {
        if self.cols != other.rows {
            return Err(EstimError::IncompatibleDimensions {
                op: OpCode::Mm,
                reason: format!("inner dimensions {} and {} differ", self.cols, other.rows),
            });
        }

        let mut out = Self::new(self.rows, other.cols);
        if self.nnz == 0 || other.nnz == 0 {
            return Ok(out);
        }

        let words = out.row_words;
        for i in 0..self.rows {
            let out_row = &mut out.data[i * words..(i + 1) * words];
            for k in 0..self.cols {
                if !self.get(i, k) {
                    continue;
                }
                let rhs_row = &other.data[k * words..(k + 1) * words];
                for (c, b) in out_row.iter_mut().zip(rhs_row) {
                    *c |= *b;
                }
            }
        }
        out.nnz = out.data.iter().map(|w| u64::from(w.count_ones())).sum();
        Ok(out)
    }
}

/// Estimator deriving exact product metadata from literal operands.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitsetEstimator;

impl BitsetEstimator {
    /// Exact characteristics of `a %*% b`.
    pub fn estimate_matmul(
        &self,
        a: &DenseMatrix,
        b: &DenseMatrix,
    ) -> Result<DataCharacteristics, EstimError> {
        let lhs = BitsetMatrix::from_dense(a);
        let out = if std::ptr::eq(a, b) {
            lhs.mat_mult(&lhs)?
        } else {
            lhs.mat_mult(&BitsetMatrix::from_dense(b))?
        };
        Ok(out.characteristics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(rows: usize, cols: usize, values: &[f64]) -> DenseMatrix {
        DenseMatrix::new(rows, cols, values.to_vec()).unwrap()
    }

    #[test]
    fn test_from_dense_pattern() {
        let m = dense(2, 3, &[1.0, 0.0, 2.0, 0.0, 0.0, 3.0]);
        let bits = BitsetMatrix::from_dense(&m);
        assert!(bits.get(0, 0));
        assert!(!bits.get(0, 1));
        assert!(bits.get(1, 2));
        assert!(!bits.get(5, 5));
        assert_eq!(bits.nnz(), 3);
    }

    #[test]
    fn test_identity_product() {
        let eye = dense(3, 3, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let m = dense(3, 3, &[0.0, 5.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let out = BitsetEstimator.estimate_matmul(&eye, &m).unwrap();
        assert_eq!(out, DataCharacteristics::exact(3, 3, 2));
    }

    #[test]
    fn test_product_fills_structure() {
        // column vector of ones times row vector of ones -> all cells set
        let col = dense(3, 1, &[1.0, 1.0, 1.0]);
        let row = dense(1, 4, &[1.0, 1.0, 1.0, 1.0]);
        let out = BitsetEstimator.estimate_matmul(&col, &row).unwrap();
        assert_eq!(out, DataCharacteristics::exact(3, 4, 12));
    }

    #[test]
    fn test_wide_rows_span_words() {
        let cols = 130;
        let mut values = vec![0.0; cols];
        values[0] = 1.0;
        values[64] = 1.0;
        values[129] = 1.0;
        let row = dense(1, cols, &values);
        let one = dense(1, 1, &[2.0]);
        let out = BitsetEstimator.estimate_matmul(&one, &row).unwrap();
        assert_eq!(out.nnz, Some(3));
    }

    #[test]
    fn test_empty_operand_short_circuits() {
        let zeros = dense(2, 2, &[0.0; 4]);
        let m = dense(2, 2, &[1.0; 4]);
        let out = BitsetEstimator.estimate_matmul(&zeros, &m).unwrap();
        assert_eq!(out, DataCharacteristics::exact(2, 2, 0));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = BitsetMatrix::new(2, 3);
        let b = BitsetMatrix::new(2, 3);
        assert!(a.mat_mult(&b).is_err());
    }
}
