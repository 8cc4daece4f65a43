//! Execution contexts.
//!
//! A [`Context`] owns one lazily built computation graph: it hands out node
//! ids, keeps the registry of constructed nodes, and is the only path from a
//! graph to the engine. Handles created from a context keep a cheap clone of
//! it, so every node knows which graph it belongs to.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use crate::config::ContextConfig;
use crate::dag::{validate_graph, DenseMatrix, Matrix, NodeId, NodeKind, NodeSpec, OperationNode, OutputType, Scalar};
use crate::error::{DagError, DagResult, GraphError};
use crate::estim::{nnz_for, DataCharacteristics, SparsityEstimator};
use crate::executor::{EngineValue, ScriptExecutor};
use crate::script::ScriptBuilder;

/// Unique identifier for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(uuid::Uuid);

impl ContextId {
    /// Creates a new random context ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters of a random matrix source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandSpec {
    /// Number of rows.
    pub rows: u64,
    /// Number of columns.
    pub cols: u64,
    /// Lower bound of generated values.
    pub min: f64,
    /// Upper bound of generated values.
    pub max: f64,
    /// Fraction of non-zero cells.
    pub sparsity: f64,
    /// Seed for reproducible generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl RandSpec {
    /// Dense uniform `[0, 1]` matrix of the given shape.
    #[must_use]
    pub const fn new(rows: u64, cols: u64) -> Self {
        Self {
            rows,
            cols,
            min: 0.0,
            max: 1.0,
            sparsity: 1.0,
            seed: None,
        }
    }

    /// Sets the value range.
    #[must_use]
    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Sets the sparsity.
    #[must_use]
    pub const fn sparsity(mut self, sparsity: f64) -> Self {
        self.sparsity = sparsity;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Default)]
struct Registry {
    registered: usize,
    per_operation: HashMap<String, usize>,
}

struct ContextInner {
    id: ContextId,
    config: ContextConfig,
    executor: Arc<dyn ScriptExecutor>,
    estimator: Arc<dyn SparsityEstimator>,
    next_node: AtomicU64,
    registry: RwLock<Registry>,
}

/// Owner of one lazy computation graph and its link to an executor.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .field("estimator", &self.inner.estimator.name())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Context {}

impl Context {
    /// Creates a context with the default configuration.
    #[must_use]
    pub fn new(executor: Arc<dyn ScriptExecutor>) -> Self {
        Self::with_config(executor, ContextConfig::default())
    }

    /// Creates a context with an explicit configuration.
    #[must_use]
    pub fn with_config(executor: Arc<dyn ScriptExecutor>, config: ContextConfig) -> Self {
        let estimator = config.estimator.build();
        Self {
            inner: Arc::new(ContextInner {
                id: ContextId::new(),
                config,
                executor,
                estimator,
                next_node: AtomicU64::new(0),
                registry: RwLock::new(Registry::default()),
            }),
        }
    }

    /// The context's identifier.
    #[must_use]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The context's configuration.
    #[must_use]
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// Estimator used for node metadata.
    #[must_use]
    pub fn estimator(&self) -> &dyn SparsityEstimator {
        self.inner.estimator.as_ref()
    }

    /// Returns true if both handles refer to the same context.
    #[must_use]
    pub fn same_context(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live nodes registered with this context.
    ///
    /// Dropped nodes no longer count, so `max_nodes` bounds the graph held in
    /// memory rather than the context's lifetime total.
    pub fn node_count(&self) -> Result<usize, GraphError> {
        let registry = self
            .inner
            .registry
            .read()
            .map_err(|_| GraphError::PoisonedRegistry)?;
        Ok(registry.registered)
    }

    /// Number of live registered nodes for one operation name.
    pub fn operation_count(&self, operation: &str) -> Result<usize, GraphError> {
        let registry = self
            .inner
            .registry
            .read()
            .map_err(|_| GraphError::PoisonedRegistry)?;
        Ok(registry.per_operation.get(operation).copied().unwrap_or(0))
    }

    /// Allocates a node id and records the node in the registry.
    ///
    /// Always returns an id; a registry failure is returned alongside it so
    /// infallible constructors can carry it on the node until validation.
    pub(crate) fn register(&self, operation: &str) -> (NodeId, Option<GraphError>) {
        let id = NodeId::new(self.inner.next_node.fetch_add(1, Ordering::Relaxed));
        let Ok(mut registry) = self.inner.registry.write() else {
            return (id, Some(GraphError::PoisonedRegistry));
        };
        let limit = self.inner.config.max_nodes;
        if registry.registered >= limit {
            return (id, Some(GraphError::NodeLimitExceeded { limit }));
        }
        registry.registered += 1;
        *registry.per_operation.entry(operation.to_string()).or_insert(0) += 1;
        trace!(context = %self.inner.id, node = %id, operation, "registered node");
        (id, None)
    }

    /// Returns a dropped node's slot to the registry.
    pub(crate) fn release(&self, operation: &str) {
        // a poisoned registry already fails every later registration
        let Ok(mut registry) = self.inner.registry.write() else {
            return;
        };
        registry.registered = registry.registered.saturating_sub(1);
        if let Some(count) = registry.per_operation.get_mut(operation) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                registry.per_operation.remove(operation);
            }
        }
    }

    /// A matrix read from `path` by the engine.
    #[must_use]
    pub fn read(&self, path: impl Into<String>) -> Matrix {
        self.read_source(path.into(), DataCharacteristics::unknown())
    }

    /// A matrix read from `path` whose metadata is known up front.
    #[must_use]
    pub fn read_with_characteristics(
        &self,
        path: impl Into<String>,
        characteristics: DataCharacteristics,
    ) -> Matrix {
        self.read_source(path.into(), characteristics)
    }

    fn read_source(&self, path: String, characteristics: DataCharacteristics) -> Matrix {
        let node = NodeSpec::new("read", NodeKind::Call, OutputType::Matrix)
            .unnamed(path)
            .characteristics(characteristics)
            .build(self);
        Matrix::from_node(node)
    }

    /// A `rows x cols` matrix filled with `value`.
    #[must_use]
    pub fn full(&self, rows: u64, cols: u64, value: f64) -> Matrix {
        let nnz = if value == 0.0 { 0 } else { rows.saturating_mul(cols) };
        let node = NodeSpec::new("matrix", NodeKind::Call, OutputType::Matrix)
            .unnamed(value)
            .named("rows", rows)
            .named("cols", cols)
            .characteristics(DataCharacteristics::exact(rows, cols, nnz))
            .build(self);
        Matrix::from_node(node)
    }

    /// A literal matrix embedded into the generated script.
    #[must_use]
    pub fn from_dense(&self, matrix: DenseMatrix) -> Matrix {
        let characteristics = matrix.characteristics();
        let node = NodeSpec::new("matrix", NodeKind::Dense(Arc::new(matrix)), OutputType::Matrix)
            .characteristics(characteristics)
            .build(self);
        Matrix::from_node(node)
    }

    /// A random matrix generated by the engine.
    #[must_use]
    pub fn rand(&self, spec: RandSpec) -> Matrix {
        let mut node = NodeSpec::new("rand", NodeKind::Call, OutputType::Matrix)
            .named("rows", spec.rows)
            .named("cols", spec.cols)
            .named("min", spec.min)
            .named("max", spec.max)
            .named("sparsity", spec.sparsity);
        if let Some(seed) = spec.seed {
            node = node.named("seed", seed);
        }
        let nnz = nnz_for(spec.rows, spec.cols, spec.sparsity);
        let node = node
            .characteristics(DataCharacteristics::exact(spec.rows, spec.cols, nnz))
            .build(self);
        Matrix::from_node(node)
    }

    /// A column vector `from, from + step, ..., <= to`.
    #[must_use]
    pub fn seq(&self, from: f64, to: f64, step: f64) -> Matrix {
        let node = NodeSpec::new("seq", NodeKind::Call, OutputType::Matrix)
            .unnamed(from)
            .unnamed(to)
            .unnamed(step)
            .characteristics(seq_characteristics(from, to, step))
            .build(self);
        Matrix::from_node(node)
    }

    /// A scalar literal.
    #[must_use]
    pub fn scalar(&self, value: f64) -> Scalar {
        let node = NodeSpec::new("literal", NodeKind::Literal, OutputType::Scalar)
            .unnamed(value)
            .characteristics(DataCharacteristics::scalar())
            .build(self);
        Scalar::from_node(node)
    }

    /// Validates, serializes and executes the graph rooted at `root`.
    pub(crate) fn submit(&self, root: &OperationNode) -> DagResult<EngineValue> {
        if self.inner.config.validate_on_submit {
            if let Err(e) = validate_graph(root) {
                warn!(context = %self.inner.id, node = %root.id(), error = %e, "graph validation failed");
                return Err(e);
            }
        }

        let script = ScriptBuilder::new().build(root);
        info!(
            context = %self.inner.id,
            script = %script.script_id,
            fingerprint = %script.fingerprint(),
            statements = script.statements.len(),
            "submitting script"
        );

        self.inner.executor.execute(&script).map_err(|e| {
            warn!(context = %self.inner.id, script = %script.script_id, error = %e, "execution failed");
            DagError::from(e)
        })
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp
)]
fn seq_characteristics(from: f64, to: f64, step: f64) -> DataCharacteristics {
    let span = (to - from) / step;
    if step == 0.0 || !span.is_finite() || span < 0.0 || span >= u64::MAX as f64 {
        return DataCharacteristics::unknown();
    }
    match (span.floor() as u64).checked_add(1) {
        Some(rows) => DataCharacteristics::with_shape(rows, 1),
        None => DataCharacteristics::unknown(),
    }
}
