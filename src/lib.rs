//! # lazydml - Lazy DML graphs for remote matrix engines
//!
//! lazydml builds programs for a declarative matrix engine without running
//! anything locally. Every operation appends an immutable node to a graph
//! owned by a [`Context`]; the graph is lowered to a straight-line script and
//! handed to a [`ScriptExecutor`] only when a result is requested.
//!
//! ## Core Concepts
//!
//! - **Context**: Owns node ids, configuration and the executor a graph is submitted to
//! - **OperationNode**: An immutable operation with positional and named inputs
//! - **Matrix / Scalar**: Typed handles that extend the graph
//! - **Builtin**: A fixed-signature engine function such as [`auc`]
//! - **DmlScript**: The lowered program, with a stable content fingerprint
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lazydml::{auc, Context, EngineValue, RecordingExecutor};
//!
//! let ctx = Context::new(Arc::new(RecordingExecutor::with_fallback(EngineValue::Scalar(0.87))));
//! let y = ctx.read("labels.csv");
//! let p = ctx.read("scores.csv");
//!
//! // Builds a node; nothing runs yet
//! let area = auc(&y, &p);
//!
//! // Validates, lowers and submits the graph
//! let value = area.compute()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Graph core
pub mod context;
pub mod dag;
pub mod error;

// Builtins and metadata
pub mod builtin;
pub mod estim;

// Lowering and execution
pub mod config;
pub mod executor;
pub mod script;

// Re-export primary types at crate root for convenience
pub use builtin::{auc, AucInputs, BuiltinSignature};
pub use config::{ContextConfig, EstimatorKind};
pub use context::{Context, ContextId, RandSpec};
pub use dag::{
    validate_graph, DenseMatrix, Literal, Matrix, NodeId, NodeInput, NodeKind, OperationNode,
    OutputType, Scalar,
};
pub use error::{DagError, DagResult, ExecutionError, GraphError, ValidationError};
pub use estim::{
    BasicAverage, BasicWorst, BitsetEstimator, BitsetMatrix, DataCharacteristics, EstimError,
    OpCode, SparsityEstimator,
};
pub use executor::{EngineValue, RecordingExecutor, ScriptExecutor};
pub use script::{DmlScript, ScriptBuilder};
