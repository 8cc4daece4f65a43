//! Lowering of graphs into scripts.

use std::collections::HashMap;

use tracing::debug;

use crate::context::ContextId;
use crate::dag::{NodeId, NodeInput, NodeKind, OperationNode};

use super::DmlScript;

/// Walks a graph from its root and emits one statement per node.
///
/// Inputs are emitted before the nodes that use them, positional inputs
/// before named ones, left to right. A node shared by several consumers is
/// emitted once. Variables are named `V0`, `V1`, ... in emission order.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    vars: HashMap<(ContextId, NodeId), String>,
    statements: Vec<String>,
}

impl ScriptBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers the graph rooted at `root`.
    #[must_use]
    pub fn build(mut self, root: &OperationNode) -> DmlScript {
        // explicit stack: long operation chains must not exhaust the call stack
        let mut stack: Vec<(&OperationNode, bool)> = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if self.vars.contains_key(&key(node)) {
                continue;
            }
            if expanded {
                self.emit(node);
                continue;
            }
            stack.push((node, true));
            for input in node.input_nodes().rev() {
                if !self.vars.contains_key(&key(input)) {
                    stack.push((&**input, false));
                }
            }
        }

        let output = self.var(root);
        let script = DmlScript::new(root.context().id(), self.statements, output, root.output_type());
        debug!(
            context = %script.context_id,
            statements = script.statements.len(),
            fingerprint = %script.fingerprint(),
            "built script"
        );
        script
    }

    fn var(&self, node: &OperationNode) -> String {
        // every input is emitted before its consumer
        self.vars
            .get(&key(node))
            .cloned()
            .unwrap_or_else(|| format!("V{}", self.vars.len()))
    }

    fn emit(&mut self, node: &OperationNode) {
        let expr = self.expression(node);
        let name = format!("V{}", self.vars.len());
        self.statements.push(format!("{name} = {expr};"));
        self.vars.insert(key(node), name);
    }

    fn render(&self, input: &NodeInput) -> String {
        match input {
            NodeInput::Node(n) => self.var(n),
            NodeInput::Literal(lit) => lit.to_dml(),
        }
    }

    fn expression(&self, node: &OperationNode) -> String {
        match node.kind() {
            NodeKind::Dense(matrix) => matrix.to_dml(),
            NodeKind::Literal => node
                .unnamed_inputs()
                .iter()
                .map(|i| self.render(i))
                .collect::<Vec<_>>()
                .join(", "),
            NodeKind::Infix => {
                let operands: Vec<String> = node.unnamed_inputs().iter().map(|i| self.render(i)).collect();
                operands.join(&format!(" {} ", node.operation()))
            }
            NodeKind::Call => {
                let args: Vec<String> = node
                    .unnamed_inputs()
                    .iter()
                    .map(|i| self.render(i))
                    .chain(
                        node.named_inputs()
                            .iter()
                            .map(|(name, i)| format!("{name}={}", self.render(i))),
                    )
                    .collect();
                format!("{}({})", node.operation(), args.join(", "))
            }
        }
    }
}

fn key(node: &OperationNode) -> (ContextId, NodeId) {
    (node.context().id(), node.id())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builtin::auc;
    use crate::context::{Context, RandSpec};
    use crate::dag::{DenseMatrix, OutputType};
    use crate::executor::RecordingExecutor;

    fn context() -> Context {
        Context::new(Arc::new(RecordingExecutor::new()))
    }

    #[test]
    fn test_auc_script() {
        let ctx = context();
        let y = ctx.read("labels.csv");
        let p = ctx.read("scores.csv");
        let script = auc(&y, &p).script();

        assert_eq!(
            script.statements,
            vec![
                "V0 = read('labels.csv');".to_string(),
                "V1 = read('scores.csv');".to_string(),
                "V2 = auc(Y=V0, P=V1);".to_string(),
            ]
        );
        assert_eq!(script.output, "V2");
        assert_eq!(script.output_type, OutputType::Scalar);
        assert_eq!(script.context_id, ctx.id());
    }

    #[test]
    fn test_shared_nodes_emitted_once() {
        let ctx = context();
        let x = ctx.read("x");
        let y = &x + &x;
        let z = y.matmul(&y.t());
        let script = z.script();

        assert_eq!(
            script.statements,
            vec![
                "V0 = read('x');".to_string(),
                "V1 = V0 + V0;".to_string(),
                "V2 = t(V1);".to_string(),
                "V3 = V1 %*% V2;".to_string(),
            ]
        );
    }

    #[test]
    fn test_sources_render() {
        let ctx = context();
        assert_eq!(
            ctx.full(2, 3, 0.5).script().statements,
            vec!["V0 = matrix(0.5, rows=2, cols=3);".to_string()]
        );
        assert_eq!(
            ctx.seq(1.0, 10.0, 1.0).script().statements,
            vec!["V0 = seq(1.0, 10.0, 1.0);".to_string()]
        );
        assert_eq!(
            ctx.rand(RandSpec::new(4, 2).sparsity(0.5).seed(7))
                .script()
                .statements,
            vec!["V0 = rand(rows=4, cols=2, min=0.0, max=1.0, sparsity=0.5, seed=7);".to_string()]
        );
        assert_eq!(
            ctx.scalar(2.5).script().statements,
            vec!["V0 = 2.5;".to_string()]
        );
        let dense = DenseMatrix::new(1, 2, vec![1.0, 0.0]).unwrap();
        assert_eq!(
            ctx.from_dense(dense).script().statements,
            vec!["V0 = matrix(\"1.0 0.0\", rows=1, cols=2);".to_string()]
        );
    }

    #[test]
    fn test_matrix_ops_render() {
        let ctx = context();
        let a = ctx.read("a");
        let b = ctx.read("b");
        let s = a.cbind(&b).rbind(&a).diag().eq_zero().reshape(2, 2).sum().script();
        assert_eq!(
            s.statements,
            vec![
                "V0 = read('a');".to_string(),
                "V1 = read('b');".to_string(),
                "V2 = cbind(V0, V1);".to_string(),
                "V3 = rbind(V2, V0);".to_string(),
                "V4 = diag(V3);".to_string(),
                "V5 = V4 == 0.0;".to_string(),
                "V6 = matrix(V5, rows=2, cols=2);".to_string(),
                "V7 = sum(V6);".to_string(),
            ]
        );
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let ctx = context();
        let mut m = ctx.read("x");
        for _ in 0..2_000 {
            m = m.t();
        }
        let script = m.script();
        assert_eq!(script.statements.len(), 2_001);
        assert_eq!(script.output, "V2000");
    }

    #[test]
    fn test_identical_graphs_share_fingerprint() {
        let ctx = context();
        let a = auc(&ctx.read("y"), &ctx.read("p")).script();
        let b = auc(&ctx.read("y"), &ctx.read("p")).script();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
