//! Context configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::estim::{BasicAverage, BasicWorst, SparsityEstimator};

/// Default upper bound on nodes a single context may register.
pub const DEFAULT_MAX_NODES: usize = 1 << 20;

/// Which closed-form estimator propagates metadata through matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Uniform non-zero distribution.
    #[default]
    Average,

    /// Upper bound on output density.
    Worst,
}

impl EstimatorKind {
    /// Instantiates the estimator.
    #[must_use]
    pub fn build(self) -> Arc<dyn SparsityEstimator> {
        match self {
            Self::Average => Arc::new(BasicAverage),
            Self::Worst => Arc::new(BasicWorst),
        }
    }
}

/// Behavior of a [`Context`](crate::Context).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Estimator used for node metadata.
    pub estimator: EstimatorKind,

    /// Run graph validation before handing a script to the executor.
    ///
    /// When disabled, malformed graphs are left for the engine to reject.
    pub validate_on_submit: bool,

    /// Maximum number of live nodes registered with one context.
    pub max_nodes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorKind::default(),
            validate_on_submit: true,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl ContextConfig {
    /// Sets the estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: EstimatorKind) -> Self {
        self.estimator = estimator;
        self
    }

    /// Enables or disables submission-time validation.
    #[must_use]
    pub fn with_validate_on_submit(mut self, enabled: bool) -> Self {
        self.validate_on_submit = enabled;
        self
    }

    /// Sets the node limit.
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }
}
