//! Operation nodes of the lazy graph.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::Context;
use crate::error::GraphError;
use crate::estim::DataCharacteristics;

use super::{DenseMatrix, Matrix, Scalar};

/// Identifier of a node within its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of value a node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    /// Two-dimensional numeric matrix.
    Matrix,
    /// Single value.
    Scalar,
    /// Heterogeneous table.
    Frame,
    /// No value (side-effect statements).
    None,
}

/// A constant argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    /// Floating point constant.
    Float(f64),
    /// Integer constant.
    Int(i64),
    /// Boolean constant.
    Bool(bool),
    /// String constant.
    Str(String),
}

impl Literal {
    /// Renders the literal as script source.
    #[must_use]
    pub fn to_dml(&self) -> String {
        match self {
            Self::Float(v) => format_float(*v),
            Self::Int(v) => v.to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        }
    }
}

/// Renders a float so the engine parses it as a double.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf".to_string() } else { "-Inf".to_string() };
    }
    let s = v.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Literal {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// An argument of an operation: another node or a constant.
#[derive(Debug, Clone)]
pub enum NodeInput {
    /// Output of another node.
    Node(Arc<OperationNode>),
    /// A constant.
    Literal(Literal),
}

impl NodeInput {
    /// The referenced node, if this input is one.
    #[must_use]
    pub fn as_node(&self) -> Option<&Arc<OperationNode>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Literal(_) => None,
        }
    }

    /// The constant, if this input is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Node(_) => None,
            Self::Literal(lit) => Some(lit),
        }
    }
}

/// Node inputs compare by identity, literals by value.
impl PartialEq for NodeInput {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => Arc::ptr_eq(a, b),
            (Self::Literal(a), Self::Literal(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&Matrix> for NodeInput {
    fn from(m: &Matrix) -> Self {
        Self::Node(Arc::clone(m.node()))
    }
}

impl From<&Scalar> for NodeInput {
    fn from(s: &Scalar) -> Self {
        Self::Node(Arc::clone(s.node()))
    }
}

impl From<Literal> for NodeInput {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

macro_rules! literal_input {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for NodeInput {
                fn from(v: $ty) -> Self {
                    Self::Literal(Literal::from(v))
                }
            }
        )*
    };
}

literal_input!(f64, i64, u64, bool, String, &str);

/// How a node is rendered into a script statement.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// `name(unnamed..., key=value...)`.
    Call,
    /// `lhs <operation> rhs`.
    Infix,
    /// The single unnamed literal input.
    Literal,
    /// Literal matrix data.
    Dense(Arc<DenseMatrix>),
}

/// One node of a lazily evaluated graph.
///
/// Nodes are immutable once built. They reference their inputs through
/// `Arc`s, so graphs can share subexpressions and never form cycles.
#[derive(Debug)]
pub struct OperationNode {
    id: NodeId,
    context: Context,
    operation: String,
    kind: NodeKind,
    output: OutputType,
    unnamed: Vec<NodeInput>,
    named: Vec<(String, NodeInput)>,
    characteristics: DataCharacteristics,
    registration: Option<GraphError>,
}

impl OperationNode {
    /// Node id within its context.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The owning context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Operation name, e.g. `"auc"` or `"%*%"`.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Rendering kind.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Kind of value produced.
    #[must_use]
    pub const fn output_type(&self) -> OutputType {
        self.output
    }

    /// Positional inputs in call order.
    #[must_use]
    pub fn unnamed_inputs(&self) -> &[NodeInput] {
        &self.unnamed
    }

    /// Named inputs in declaration order.
    #[must_use]
    pub fn named_inputs(&self) -> &[(String, NodeInput)] {
        &self.named
    }

    /// A named input by name.
    #[must_use]
    pub fn named_input(&self, name: &str) -> Option<&NodeInput> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, input)| input)
    }

    /// Named inputs as an order-insensitive mapping.
    #[must_use]
    pub fn named_input_map(&self) -> BTreeMap<&str, &NodeInput> {
        self.named.iter().map(|(n, input)| (n.as_str(), input)).collect()
    }

    /// Known or estimated output metadata.
    #[must_use]
    pub const fn characteristics(&self) -> DataCharacteristics {
        self.characteristics
    }

    /// Literal matrix data, for dense literal nodes.
    #[must_use]
    pub fn dense(&self) -> Option<&DenseMatrix> {
        match &self.kind {
            NodeKind::Dense(m) => Some(m),
            _ => None,
        }
    }

    /// Registry failure recorded when the node was built.
    #[must_use]
    pub const fn registration_error(&self) -> Option<&GraphError> {
        self.registration.as_ref()
    }

    /// Node inputs, positional first, then named.
    pub fn input_nodes(&self) -> impl DoubleEndedIterator<Item = &Arc<OperationNode>> + '_ {
        self.unnamed
            .iter()
            .chain(self.named.iter().map(|(_, input)| input))
            .filter_map(NodeInput::as_node)
    }
}

impl OperationNode {
    fn drain_input_nodes(&mut self, out: &mut Vec<Arc<OperationNode>>) {
        let unnamed = std::mem::take(&mut self.unnamed);
        let named = std::mem::take(&mut self.named);
        out.extend(
            unnamed
                .into_iter()
                .chain(named.into_iter().map(|(_, input)| input))
                .filter_map(|input| match input {
                    NodeInput::Node(node) => Some(node),
                    NodeInput::Literal(_) => None,
                }),
        );
    }
}

/// Releases the node's registry slot and tears down inputs iteratively, so
/// dropping a long chain does not recurse once per node.
impl Drop for OperationNode {
    fn drop(&mut self) {
        if self.registration.is_none() {
            self.context.release(&self.operation);
        }

        let mut pending = Vec::new();
        self.drain_input_nodes(&mut pending);
        while let Some(node) = pending.pop() {
            // shared inputs stay alive through their other owners
            if let Ok(mut node) = Arc::try_unwrap(node) {
                node.drain_input_nodes(&mut pending);
            }
        }
    }
}

/// Description of a node before it is registered with a context.
#[derive(Debug)]
pub(crate) struct NodeSpec {
    operation: String,
    kind: NodeKind,
    output: OutputType,
    unnamed: Vec<NodeInput>,
    named: Vec<(String, NodeInput)>,
    characteristics: DataCharacteristics,
}

impl NodeSpec {
    pub(crate) fn new(operation: impl Into<String>, kind: NodeKind, output: OutputType) -> Self {
        Self {
            operation: operation.into(),
            kind,
            output,
            unnamed: Vec::new(),
            named: Vec::new(),
            characteristics: DataCharacteristics::unknown(),
        }
    }

    pub(crate) fn unnamed(mut self, input: impl Into<NodeInput>) -> Self {
        self.unnamed.push(input.into());
        self
    }

    pub(crate) fn named(mut self, name: impl Into<String>, input: impl Into<NodeInput>) -> Self {
        self.named.push((name.into(), input.into()));
        self
    }

    pub(crate) fn characteristics(mut self, characteristics: DataCharacteristics) -> Self {
        self.characteristics = characteristics;
        self
    }

    /// Registers the node with `context` and freezes it.
    pub(crate) fn build(self, context: &Context) -> Arc<OperationNode> {
        let (id, registration) = context.register(&self.operation);
        if let Some(err) = &registration {
            trace!(context = %context.id(), node = %id, error = %err, "node registered with deferred error");
        }
        Arc::new(OperationNode {
            id,
            context: context.clone(),
            operation: self.operation,
            kind: self.kind,
            output: self.output,
            unnamed: self.unnamed,
            named: self.named,
            characteristics: self.characteristics,
            registration,
        })
    }
}
