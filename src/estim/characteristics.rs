//! Shape and non-zero metadata attached to matrix nodes.

use serde::{Deserialize, Serialize};

/// Dimensions and non-zero count of a (possibly not yet computed) matrix.
///
/// Every field is optional: graphs built from `read` sources typically know
/// nothing until the engine inspects the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataCharacteristics {
    /// Number of rows, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,

    /// Number of columns, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols: Option<u64>,

    /// Number of non-zero cells, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nnz: Option<u64>,
}

impl DataCharacteristics {
    /// Fully unknown metadata.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            rows: None,
            cols: None,
            nnz: None,
        }
    }

    /// Known shape, unknown non-zeros.
    #[must_use]
    pub const fn with_shape(rows: u64, cols: u64) -> Self {
        Self {
            rows: Some(rows),
            cols: Some(cols),
            nnz: None,
        }
    }

    /// Known shape and non-zeros.
    #[must_use]
    pub const fn exact(rows: u64, cols: u64, nnz: u64) -> Self {
        Self {
            rows: Some(rows),
            cols: Some(cols),
            nnz: Some(nnz),
        }
    }

    /// Metadata of a scalar result.
    #[must_use]
    pub const fn scalar() -> Self {
        Self::with_shape(1, 1)
    }

    /// Builds metadata from a shape and a sparsity in `[0, 1]`.
    #[must_use]
    pub fn from_sparsity(rows: u64, cols: u64, sparsity: f64) -> Self {
        Self::exact(rows, cols, nnz_for(rows, cols, sparsity))
    }

    /// Returns true if both dimensions are known.
    #[must_use]
    pub const fn is_known_shape(&self) -> bool {
        self.rows.is_some() && self.cols.is_some()
    }

    /// Number of cells, if the shape is known.
    #[must_use]
    pub fn cells(&self) -> Option<u64> {
        Some(self.rows?.saturating_mul(self.cols?))
    }

    /// Fraction of non-zero cells, if shape and nnz are known.
    ///
    /// An empty (0-cell) matrix has sparsity 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sparsity(&self) -> Option<f64> {
        let cells = self.cells()?;
        let nnz = self.nnz?;
        if cells == 0 {
            return Some(0.0);
        }
        Some((nnz as f64 / cells as f64).clamp(0.0, 1.0))
    }

    /// Returns true if this describes a single-column matrix.
    #[must_use]
    pub fn is_column_vector(&self) -> Option<bool> {
        self.cols.map(|c| c == 1)
    }
}

/// Number of non-zeros for a shape at the given sparsity, rounded.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn nnz_for(rows: u64, cols: u64, sparsity: f64) -> u64 {
    let cells = rows.saturating_mul(cols) as f64;
    (sparsity.clamp(0.0, 1.0) * cells).round() as u64
}
