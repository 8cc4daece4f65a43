//! Error types for lazydml.
//!
//! Graph construction never fails for builtin bindings; errors surface when a
//! graph is validated, serialized or submitted to an executor. All errors are
//! strongly typed using thiserror so callers can match on specific conditions.

use thiserror::Error;

use crate::context::ContextId;
use crate::dag::NodeId;

/// Validation errors raised by deferred graph and script checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Node {node} belongs to context {actual}, expected {expected}")]
    ContextMismatch {
        node: NodeId,
        expected: ContextId,
        actual: ContextId,
    },

    #[error("Shape mismatch in '{operation}': {reason}")]
    ShapeMismatch {
        operation: String,
        reason: String,
    },

    #[error("Operation '{operation}' is missing required input '{name}'")]
    MissingInput {
        operation: String,
        name: String,
    },

    #[error("Operation '{operation}' received unexpected input '{name}'")]
    UnexpectedInput {
        operation: String,
        name: String,
    },

    #[error("Field '{field}' is not a valid identifier: '{value}'")]
    InvalidIdentifier {
        field: String,
        value: String,
    },

    #[error("Dense matrix {rows}x{cols} requires {expected} values, got {actual}")]
    DenseValueCount {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },
}

/// Errors reported by the execution seam.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Engine error: {message}")]
    Engine {
        message: String,
    },

    #[error("Script rejected by engine: {reason}")]
    Rejected {
        reason: String,
    },

    #[error("Execution timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Expected {expected} output, engine returned {actual}")]
    UnexpectedOutput {
        expected: String,
        actual: String,
    },
}

/// Errors raised by the node registry of a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Context node limit of {limit} exceeded")]
    NodeLimitExceeded {
        limit: usize,
    },

    #[error("Node registry lock poisoned")]
    PoisonedRegistry,
}

/// Top-level error type for lazydml.
#[derive(Debug, Error)]
pub enum DagError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl DagError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a graph error.
    #[must_use]
    pub const fn is_graph(&self) -> bool {
        matches!(self, Self::Graph(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if resubmitting the same script may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Execution(e) => matches!(e, ExecutionError::Timeout { .. } | ExecutionError::Engine { .. }),
            Self::Validation(_) | Self::Graph(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for lazydml operations.
pub type DagResult<T> = Result<T, DagError>;
