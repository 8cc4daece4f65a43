//! Typed handles over graph nodes.

use std::ops::Deref;
use std::sync::Arc;

use crate::error::DagResult;
use crate::script::{DmlScript, ScriptBuilder};

use super::{DenseMatrix, OperationNode};

/// Handle to a node producing a matrix.
#[derive(Debug, Clone)]
pub struct Matrix(Arc<OperationNode>);

/// Handle to a node producing a scalar.
#[derive(Debug, Clone)]
pub struct Scalar(Arc<OperationNode>);

macro_rules! handle_common {
    ($handle:ident) => {
        impl $handle {
            pub(crate) fn from_node(node: Arc<OperationNode>) -> Self {
                Self(node)
            }

            /// The underlying shared node.
            #[must_use]
            pub fn node(&self) -> &Arc<OperationNode> {
                &self.0
            }

            /// Returns true if both handles point at the same node.
            #[must_use]
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }

            /// Builds the script that would compute this handle, without running it.
            #[must_use]
            pub fn script(&self) -> DmlScript {
                ScriptBuilder::new().build(&self.0)
            }
        }

        impl Deref for $handle {
            type Target = OperationNode;

            fn deref(&self) -> &OperationNode {
                &self.0
            }
        }

        /// Handles compare by node identity.
        impl PartialEq for $handle {
            fn eq(&self, other: &Self) -> bool {
                self.ptr_eq(other)
            }
        }

        impl Eq for $handle {}
    };
}

handle_common!(Matrix);
handle_common!(Scalar);

impl Matrix {
    /// Submits the graph and returns the computed matrix.
    pub fn compute(&self) -> DagResult<DenseMatrix> {
        let value = self.context().submit(&self.0)?;
        Ok(value.into_matrix()?)
    }
}

impl Scalar {
    /// Submits the graph and returns the computed value.
    pub fn compute(&self) -> DagResult<f64> {
        let value = self.context().submit(&self.0)?;
        Ok(value.into_scalar()?)
    }
}
