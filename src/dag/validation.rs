//! Submission-time graph validation.
//!
//! Node construction never checks anything. This pass runs right before a
//! graph is serialized for the engine and rejects graphs the engine would
//! certainly reject: nodes from another context, registry failures,
//! builtin calls with the wrong named inputs, and known shape conflicts.
//! Value-level conventions (label encodings, score ranges) stay with the
//! engine.

use std::collections::HashSet;

use crate::builtin;
use crate::context::ContextId;
use crate::error::{DagError, ValidationError};
use crate::estim::DataCharacteristics;

use super::{NodeId, NodeKind, OperationNode};

/// Validates every node reachable from `root`.
pub fn validate_graph(root: &OperationNode) -> Result<(), DagError> {
    let expected = root.context().id();
    let mut visited: HashSet<(ContextId, NodeId)> = HashSet::new();
    let mut stack: Vec<&OperationNode> = vec![root];

    while let Some(node) = stack.pop() {
        if !visited.insert((node.context().id(), node.id())) {
            continue;
        }
        validate_node(node, expected)?;
        stack.extend(node.input_nodes().map(|n| &**n));
    }
    Ok(())
}

fn validate_node(node: &OperationNode, expected: ContextId) -> Result<(), DagError> {
    if let Some(err) = node.registration_error() {
        return Err(DagError::Graph(err.clone()));
    }

    let actual = node.context().id();
    if actual != expected {
        return Err(ValidationError::ContextMismatch {
            node: node.id(),
            expected,
            actual,
        }
        .into());
    }

    if matches!(node.kind(), NodeKind::Call) {
        if let Some(signature) = builtin::lookup(node.operation()) {
            check_signature(node, signature.params)?;
        }
    }

    check_shapes(node)?;
    Ok(())
}

fn check_signature(node: &OperationNode, params: &[&str]) -> Result<(), ValidationError> {
    for param in params {
        if node.named_input(param).is_none() {
            return Err(ValidationError::MissingInput {
                operation: node.operation().to_string(),
                name: (*param).to_string(),
            });
        }
    }
    for (name, _) in node.named_inputs() {
        if !params.contains(&name.as_str()) {
            return Err(ValidationError::UnexpectedInput {
                operation: node.operation().to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn positional(node: &OperationNode, idx: usize) -> Option<DataCharacteristics> {
    node.unnamed_inputs()
        .get(idx)
        .and_then(|input| input.as_node())
        .map(|n| n.characteristics())
}

fn named(node: &OperationNode, name: &str) -> Option<DataCharacteristics> {
    node.named_input(name)
        .and_then(|input| input.as_node())
        .map(|n| n.characteristics())
}

fn mismatch(node: &OperationNode, reason: String) -> ValidationError {
    ValidationError::ShapeMismatch {
        operation: node.operation().to_string(),
        reason,
    }
}

fn check_shapes(node: &OperationNode) -> Result<(), ValidationError> {
    match node.operation() {
        "auc" => {
            let (Some(y), Some(p)) = (named(node, "Y"), named(node, "P")) else {
                return Ok(());
            };
            for (name, dc) in [("Y", y), ("P", p)] {
                if dc.is_column_vector() == Some(false) {
                    let cols = dc.cols.unwrap_or_default();
                    return Err(mismatch(
                        node,
                        format!("{name} must be a column vector, got {cols} columns"),
                    ));
                }
            }
            if let (Some(yr), Some(pr)) = (y.rows, p.rows) {
                if yr != pr {
                    return Err(mismatch(node, format!("Y has {yr} rows, P has {pr}")));
                }
            }
        }
        "%*%" => {
            let (Some(a), Some(b)) = (positional(node, 0), positional(node, 1)) else {
                return Ok(());
            };
            if let (Some(k1), Some(k2)) = (a.cols, b.rows) {
                if k1 != k2 {
                    return Err(mismatch(node, format!("inner dimensions {k1} and {k2} differ")));
                }
            }
        }
        "+" | "*" => {
            let (Some(a), Some(b)) = (positional(node, 0), positional(node, 1)) else {
                return Ok(());
            };
            if let (Some(ar), Some(ac), Some(br), Some(bc)) = (a.rows, a.cols, b.rows, b.cols) {
                let broadcast = (ar == br && bc == 1)
                    || (ac == bc && br == 1)
                    || (br == 1 && bc == 1)
                    || (ac == 1 && br == 1);
                if !(ar == br && ac == bc) && !broadcast {
                    return Err(mismatch(
                        node,
                        format!("cannot combine {ar}x{ac} with {br}x{bc}"),
                    ));
                }
            }
        }
        "cbind" => {
            let (Some(a), Some(b)) = (positional(node, 0), positional(node, 1)) else {
                return Ok(());
            };
            if let (Some(ar), Some(br)) = (a.rows, b.rows) {
                if ar != br {
                    return Err(mismatch(node, format!("row counts {ar} and {br} differ")));
                }
            }
        }
        "rbind" => {
            let (Some(a), Some(b)) = (positional(node, 0), positional(node, 1)) else {
                return Ok(());
            };
            if let (Some(ac), Some(bc)) = (a.cols, b.cols) {
                if ac != bc {
                    return Err(mismatch(node, format!("column counts {ac} and {bc} differ")));
                }
            }
        }
        "matrix" => {
            // reshape: a node input plus target rows/cols
            let Some(input) = positional(node, 0) else {
                return Ok(());
            };
            if let (Some(from), Some(to)) = (input.cells(), node.characteristics().cells()) {
                if from != to {
                    return Err(mismatch(
                        node,
                        format!("cannot reshape {from} cells into {to}"),
                    ));
                }
            }
        }
        _ => {}
    }
    Ok(())
}
