//! Sparsity estimation for lazily built matrix graphs.
//!
//! Nodes carry [`DataCharacteristics`] so that shape checks can run before a
//! script is submitted and so that callers can inspect the expected density
//! of intermediates. Estimators never see data, except [`BitsetMatrix`] which
//! derives the exact non-zero structure of a product from two literal inputs.

mod basic;
mod bitset;
mod characteristics;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use basic::{BasicAverage, BasicWorst};
pub use bitset::{BitsetEstimator, BitsetMatrix};
pub use characteristics::{nnz_for, DataCharacteristics};

/// Matrix operations with known metadata propagation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpCode {
    /// Matrix multiplication.
    Mm,
    /// Elementwise multiplication.
    Mult,
    /// Elementwise addition.
    Plus,
    /// Indicator of zero cells.
    EqZero,
    /// Indicator of non-zero cells.
    NeqZero,
    /// Vector to diagonal matrix, or matrix diagonal to vector.
    Diag,
    /// Column-wise append.
    Cbind,
    /// Row-wise append.
    Rbind,
    /// Transpose.
    Trans,
    /// Row-major reshape into a new shape.
    Reshape {
        /// Target rows.
        rows: u64,
        /// Target columns.
        cols: u64,
    },
}

impl OpCode {
    /// Returns true if the operation takes two matrix operands.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Mm | Self::Mult | Self::Plus | Self::Cbind | Self::Rbind)
    }
}

/// Estimation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimError {
    /// A binary operation was estimated without its right-hand side.
    #[error("Operation {op:?} requires a second operand")]
    MissingOperand {
        /// The operation.
        op: OpCode,
    },

    /// A unary operation was estimated with a right-hand side.
    #[error("Operation {op:?} takes a single operand")]
    UnexpectedOperand {
        /// The operation.
        op: OpCode,
    },

    /// Operand dimensions are incompatible.
    #[error("Incompatible dimensions for {op:?}: {reason}")]
    IncompatibleDimensions {
        /// The operation.
        op: OpCode,
        /// What did not line up.
        reason: String,
    },
}

/// Estimates output metadata of a matrix operation from its input metadata.
pub trait SparsityEstimator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Estimates the characteristics of `op(lhs, rhs)`.
    ///
    /// Unknown input dimensions yield unknown output fields rather than errors.
    fn estimate(
        &self,
        op: OpCode,
        lhs: &DataCharacteristics,
        rhs: Option<&DataCharacteristics>,
    ) -> Result<DataCharacteristics, EstimError>;
}

/// Checks operand arity against [`OpCode::is_binary`].
fn check_operands(op: OpCode, rhs: Option<&DataCharacteristics>) -> Result<(), EstimError> {
    match (op.is_binary(), rhs.is_some()) {
        (true, false) => Err(EstimError::MissingOperand { op }),
        (false, true) => Err(EstimError::UnexpectedOperand { op }),
        _ => Ok(()),
    }
}

fn require_rhs<'a>(
    op: OpCode,
    rhs: Option<&'a DataCharacteristics>,
) -> Result<&'a DataCharacteristics, EstimError> {
    rhs.ok_or(EstimError::MissingOperand { op })
}

fn add_known(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    Some(a?.saturating_add(b?))
}

/// Metadata rules shared by all estimators: operations whose output
/// non-zero count follows exactly from the input.
pub(crate) fn exact_metadata(
    op: OpCode,
    lhs: &DataCharacteristics,
    rhs: Option<&DataCharacteristics>,
) -> Result<DataCharacteristics, EstimError> {
    check_operands(op, rhs)?;
    let out = match op {
        OpCode::EqZero => DataCharacteristics {
            rows: lhs.rows,
            cols: lhs.cols,
            nnz: lhs.cells().zip(lhs.nnz).map(|(c, n)| c.saturating_sub(n)),
        },
        OpCode::NeqZero => *lhs,
        OpCode::Trans => DataCharacteristics {
            rows: lhs.cols,
            cols: lhs.rows,
            nnz: lhs.nnz,
        },
        OpCode::Diag => match lhs.cols {
            Some(1) => DataCharacteristics {
                rows: lhs.rows,
                cols: lhs.rows,
                nnz: lhs.nnz,
            },
            Some(_) => DataCharacteristics {
                rows: lhs.rows,
                cols: Some(1),
                nnz: lhs.rows.zip(lhs.nnz).map(|(r, n)| r.min(n)),
            },
            None => DataCharacteristics::unknown(),
        },
        OpCode::Cbind => {
            let rhs = require_rhs(op, rhs)?;
            DataCharacteristics {
                rows: lhs.rows.or(rhs.rows),
                cols: add_known(lhs.cols, rhs.cols),
                nnz: add_known(lhs.nnz, rhs.nnz),
            }
        }
        OpCode::Rbind => {
            let rhs = require_rhs(op, rhs)?;
            DataCharacteristics {
                rows: add_known(lhs.rows, rhs.rows),
                cols: lhs.cols.or(rhs.cols),
                nnz: add_known(lhs.nnz, rhs.nnz),
            }
        }
        OpCode::Reshape { rows, cols } => {
            if let Some(cells) = lhs.cells() {
                if cells != rows.saturating_mul(cols) {
                    return Err(EstimError::IncompatibleDimensions {
                        op,
                        reason: format!("cannot reshape {cells} cells into {rows}x{cols}"),
                    });
                }
            }
            DataCharacteristics {
                rows: Some(rows),
                cols: Some(cols),
                nnz: lhs.nnz,
            }
        }
        OpCode::Mm | OpCode::Mult | OpCode::Plus => {
            return Err(EstimError::IncompatibleDimensions {
                op,
                reason: "no exact metadata rule".to_string(),
            })
        }
    };
    Ok(out)
}
