//! Lazily evaluated operation graphs.
//!
//! A graph is a set of immutable [`OperationNode`]s linked through shared
//! references. Typed handles ([`Matrix`], [`Scalar`]) wrap nodes and expose
//! the operations that extend the graph. Nothing is computed until a handle
//! is submitted with `compute()`.

mod dense;
mod handle;
mod node;
mod ops;
mod validation;

pub use dense::DenseMatrix;
pub use handle::{Matrix, Scalar};
pub use node::{Literal, NodeId, NodeInput, NodeKind, OperationNode, OutputType};
pub use validation::validate_graph;

pub(crate) use node::NodeSpec;
