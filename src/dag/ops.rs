//! Lazy matrix operations.
//!
//! Every operation appends one node to the left operand's context and
//! propagates metadata through the context's estimator. Nothing is checked
//! here; incompatible shapes are reported by validation at submission.

use std::ops::{Add, Mul};

use tracing::debug;

use crate::estim::{BitsetEstimator, DataCharacteristics, OpCode};

use super::{Matrix, NodeKind, NodeSpec, OutputType, Scalar};

impl Matrix {
    fn estimate(&self, op: OpCode, rhs: Option<&Matrix>) -> DataCharacteristics {
        let rhs_dc = rhs.map(|m| m.characteristics());
        self.context()
            .estimator()
            .estimate(op, &self.characteristics(), rhs_dc.as_ref())
            .unwrap_or_else(|e| {
                debug!(node = %self.id(), error = %e, "metadata unavailable");
                DataCharacteristics::unknown()
            })
    }

    fn infix(&self, symbol: &str, op: OpCode, rhs: &Matrix, dc: Option<DataCharacteristics>) -> Matrix {
        let dc = dc.unwrap_or_else(|| self.estimate(op, Some(rhs)));
        let node = NodeSpec::new(symbol, NodeKind::Infix, OutputType::Matrix)
            .unnamed(self)
            .unnamed(rhs)
            .characteristics(dc)
            .build(self.context());
        Matrix::from_node(node)
    }

    fn call(&self, name: &str, op: OpCode, rhs: Option<&Matrix>) -> Matrix {
        let dc = self.estimate(op, rhs);
        let mut spec = NodeSpec::new(name, NodeKind::Call, OutputType::Matrix).unnamed(self);
        if let Some(rhs) = rhs {
            spec = spec.unnamed(rhs);
        }
        Matrix::from_node(spec.characteristics(dc).build(self.context()))
    }

    /// Matrix product `self %*% rhs`.
    ///
    /// When both operands are literal matrices the output non-zero count is
    /// exact rather than estimated.
    #[must_use]
    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        let exact = match (self.dense(), rhs.dense()) {
            (Some(a), Some(b)) => BitsetEstimator.estimate_matmul(a, b).ok(),
            _ => None,
        };
        self.infix("%*%", OpCode::Mm, rhs, exact)
    }

    /// Transpose.
    #[must_use]
    pub fn t(&self) -> Matrix {
        self.call("t", OpCode::Trans, None)
    }

    /// Appends `rhs` to the right.
    #[must_use]
    pub fn cbind(&self, rhs: &Matrix) -> Matrix {
        self.call("cbind", OpCode::Cbind, Some(rhs))
    }

    /// Appends `rhs` below.
    #[must_use]
    pub fn rbind(&self, rhs: &Matrix) -> Matrix {
        self.call("rbind", OpCode::Rbind, Some(rhs))
    }

    /// Diagonal matrix from a vector, or diagonal vector from a matrix.
    #[must_use]
    pub fn diag(&self) -> Matrix {
        self.call("diag", OpCode::Diag, None)
    }

    /// Indicator matrix of zero cells.
    #[must_use]
    pub fn eq_zero(&self) -> Matrix {
        self.compare("==", OpCode::EqZero)
    }

    /// Indicator matrix of non-zero cells.
    #[must_use]
    pub fn neq_zero(&self) -> Matrix {
        self.compare("!=", OpCode::NeqZero)
    }

    fn compare(&self, symbol: &str, op: OpCode) -> Matrix {
        let dc = self.estimate(op, None);
        let node = NodeSpec::new(symbol, NodeKind::Infix, OutputType::Matrix)
            .unnamed(self)
            .unnamed(0.0)
            .characteristics(dc)
            .build(self.context());
        Matrix::from_node(node)
    }

    /// Row-major reshape into `rows x cols`.
    #[must_use]
    pub fn reshape(&self, rows: u64, cols: u64) -> Matrix {
        let dc = self.estimate(OpCode::Reshape { rows, cols }, None);
        let dc = if dc.is_known_shape() {
            dc
        } else {
            DataCharacteristics::with_shape(rows, cols)
        };
        let node = NodeSpec::new("matrix", NodeKind::Call, OutputType::Matrix)
            .unnamed(self)
            .named("rows", rows)
            .named("cols", cols)
            .characteristics(dc)
            .build(self.context());
        Matrix::from_node(node)
    }

    /// Sum of all cells.
    #[must_use]
    pub fn sum(&self) -> Scalar {
        let node = NodeSpec::new("sum", NodeKind::Call, OutputType::Scalar)
            .unnamed(self)
            .characteristics(DataCharacteristics::scalar())
            .build(self.context());
        Scalar::from_node(node)
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: &Matrix) -> Matrix {
        self.infix("+", OpCode::Plus, rhs, None)
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    /// Elementwise product.
    fn mul(self, rhs: &Matrix) -> Matrix {
        self.infix("*", OpCode::Mult, rhs, None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::{ContextConfig, EstimatorKind};
    use crate::context::Context;
    use crate::dag::{DenseMatrix, NodeInput};
    use crate::estim::DataCharacteristics;
    use crate::executor::RecordingExecutor;

    fn context(kind: EstimatorKind) -> Context {
        Context::with_config(
            Arc::new(RecordingExecutor::new()),
            ContextConfig::default().with_estimator(kind),
        )
    }

    #[test]
    fn test_matmul_records_inputs_in_order() {
        let ctx = context(EstimatorKind::Average);
        let a = ctx.read("a");
        let b = ctx.read("b");
        let c = a.matmul(&b);

        assert_eq!(c.operation(), "%*%");
        assert_eq!(c.unnamed_inputs(), &[NodeInput::from(&a), NodeInput::from(&b)]);
        assert!(c.named_inputs().is_empty());
    }

    #[test]
    fn test_matmul_of_literals_is_exact() {
        let ctx = context(EstimatorKind::Worst);
        let eye = ctx.from_dense(DenseMatrix::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap());
        let m = ctx.from_dense(DenseMatrix::new(2, 2, vec![0.0, 3.0, 0.0, 0.0]).unwrap());
        let out = eye.matmul(&m);
        // the worst-case estimator alone would report 4
        assert_eq!(out.characteristics(), DataCharacteristics::exact(2, 2, 1));
    }

    #[test]
    fn test_estimator_choice_changes_metadata() {
        let dc = DataCharacteristics::exact(10, 10, 50);
        let avg = context(EstimatorKind::Average);
        let worst = context(EstimatorKind::Worst);

        let a = avg.read_with_characteristics("a", dc);
        let b = avg.read_with_characteristics("b", dc);
        assert_eq!((&a + &b).characteristics().nnz, Some(75));

        let c = worst.read_with_characteristics("a", dc);
        let d = worst.read_with_characteristics("b", dc);
        assert_eq!((&c + &d).characteristics().nnz, Some(100));
    }

    #[test]
    fn test_mismatched_shapes_do_not_fail_construction() {
        let ctx = context(EstimatorKind::Average);
        let a = ctx.read_with_characteristics("a", DataCharacteristics::with_shape(3, 4));
        let b = ctx.read_with_characteristics("b", DataCharacteristics::with_shape(5, 2));
        let c = a.matmul(&b);
        assert_eq!(c.characteristics(), DataCharacteristics::unknown());
    }

    #[test]
    fn test_reshape_and_transpose_metadata() {
        let ctx = context(EstimatorKind::Average);
        let a = ctx.full(2, 6, 1.0);
        assert_eq!(a.t().characteristics(), DataCharacteristics::exact(6, 2, 12));
        assert_eq!(
            a.reshape(3, 4).characteristics(),
            DataCharacteristics::exact(3, 4, 12)
        );

        let unknown = ctx.read("u");
        assert_eq!(
            unknown.reshape(3, 4).characteristics(),
            DataCharacteristics::with_shape(3, 4)
        );
    }

    #[test]
    fn test_zero_indicators() {
        let ctx = context(EstimatorKind::Average);
        let m = ctx.from_dense(DenseMatrix::new(1, 4, vec![0.0, 1.0, 0.0, 2.0]).unwrap());
        assert_eq!(m.eq_zero().characteristics().nnz, Some(2));
        assert_eq!(m.neq_zero().characteristics().nnz, Some(2));
        assert_eq!(m.eq_zero().unnamed_inputs()[1], NodeInput::from(0.0));
    }

    #[test]
    fn test_sum_is_scalar() {
        let ctx = context(EstimatorKind::Average);
        let s = ctx.read("x").sum();
        assert_eq!(s.output_type(), crate::dag::OutputType::Scalar);
        assert_eq!(s.characteristics(), DataCharacteristics::scalar());
    }
}
