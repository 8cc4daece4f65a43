//! Closed-form sparsity estimators.

use super::{check_operands, exact_metadata, require_rhs, DataCharacteristics, EstimError, OpCode, SparsityEstimator};

/// Average-case estimator assuming uniformly distributed non-zeros.
///
/// Matrix multiply: `sp = 1 - (1 - sp1 * sp2)^k`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAverage;

/// Worst-case estimator.
///
/// Matrix multiply: `sp = min(1, sp1 * k) * min(1, sp2 * k)`. For outer
/// products (`k = 1`) this equals the average case and the exact result.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicWorst;

#[derive(Clone, Copy)]
enum Case {
    Average,
    Worst,
}

impl SparsityEstimator for BasicAverage {
    fn name(&self) -> &'static str {
        "basic_average"
    }

    fn estimate(
        &self,
        op: OpCode,
        lhs: &DataCharacteristics,
        rhs: Option<&DataCharacteristics>,
    ) -> Result<DataCharacteristics, EstimError> {
        estimate(Case::Average, op, lhs, rhs)
    }
}

impl SparsityEstimator for BasicWorst {
    fn name(&self) -> &'static str {
        "basic_worst"
    }

    fn estimate(
        &self,
        op: OpCode,
        lhs: &DataCharacteristics,
        rhs: Option<&DataCharacteristics>,
    ) -> Result<DataCharacteristics, EstimError> {
        estimate(Case::Worst, op, lhs, rhs)
    }
}

fn estimate(
    case: Case,
    op: OpCode,
    lhs: &DataCharacteristics,
    rhs: Option<&DataCharacteristics>,
) -> Result<DataCharacteristics, EstimError> {
    check_operands(op, rhs)?;
    match op {
        OpCode::Mm => {
            let rhs = require_rhs(op, rhs)?;
            if let (Some(k1), Some(k2)) = (lhs.cols, rhs.rows) {
                if k1 != k2 {
                    return Err(EstimError::IncompatibleDimensions {
                        op,
                        reason: format!("inner dimensions {k1} and {k2} differ"),
                    });
                }
            }
            Ok(matmul(case, lhs, rhs))
        }
        OpCode::Mult | OpCode::Plus => {
            let rhs = require_rhs(op, rhs)?;
            let sparsity = lhs.sparsity().zip(rhs.sparsity()).map(|(s1, s2)| {
                match (op, case) {
                    (OpCode::Mult, Case::Average) => s1 * s2,
                    (OpCode::Mult, Case::Worst) => s1.min(s2),
                    (_, Case::Average) => s1 + s2 - s1 * s2,
                    (_, Case::Worst) => (s1 + s2).min(1.0),
                }
            });
            Ok(elementwise(lhs, rhs, sparsity))
        }
        _ => exact_metadata(op, lhs, rhs),
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn matmul(case: Case, lhs: &DataCharacteristics, rhs: &DataCharacteristics) -> DataCharacteristics {
    let (Some(m), Some(n)) = (lhs.rows, rhs.cols) else {
        return DataCharacteristics {
            rows: lhs.rows,
            cols: rhs.cols,
            nnz: None,
        };
    };
    let inputs = lhs.sparsity().zip(rhs.sparsity()).zip(lhs.cols);
    let Some(((s1, s2), k)) = inputs else {
        return DataCharacteristics::with_shape(m, n);
    };
    let k = k as f64;
    let sparsity = match case {
        Case::Average => 1.0 - (1.0 - s1 * s2).powi(k.min(f64::from(i32::MAX)) as i32),
        Case::Worst => (s1 * k).min(1.0) * (s2 * k).min(1.0),
    };
    DataCharacteristics::from_sparsity(m, n, sparsity)
}

/// Output extent of one broadcast dimension. A vector side of length 1
/// takes the other side's length.
fn broadcast_dim(lhs: Option<u64>, rhs: Option<u64>) -> Option<u64> {
    match (lhs, rhs) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) if a != 1 => Some(a),
        _ => None,
    }
}

fn elementwise(
    lhs: &DataCharacteristics,
    rhs: &DataCharacteristics,
    sparsity: Option<f64>,
) -> DataCharacteristics {
    let rows = broadcast_dim(lhs.rows, rhs.rows);
    let cols = broadcast_dim(lhs.cols, rhs.cols);
    match (rows, cols, sparsity) {
        (Some(r), Some(c), Some(sp)) => DataCharacteristics::from_sparsity(r, c, sp),
        _ => DataCharacteristics {
            rows,
            cols,
            nnz: None,
        },
    }
}
