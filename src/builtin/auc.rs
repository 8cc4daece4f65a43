//! Area under the ROC curve.

use crate::dag::{Matrix, NodeKind, NodeSpec, OutputType, Scalar};
use crate::estim::DataCharacteristics;

use super::BuiltinSignature;

/// Signature of the `auc` builtin.
pub const AUC: BuiltinSignature = BuiltinSignature {
    name: "auc",
    params: &["Y", "P"],
    output: OutputType::Scalar,
};

/// Named inputs of [`auc`].
///
/// Both fields are required, so a call site that compiles always supplies
/// exactly `Y` and `P`.
#[derive(Debug, Clone)]
pub struct AucInputs {
    /// Binary response vector (n x 1), encoded as -1/+1 or 0/1.
    pub y: Matrix,

    /// Prediction scores for the true class (n x 1), expected in `[0, 1]`.
    pub p: Matrix,
}

impl AucInputs {
    /// Groups the two inputs.
    #[must_use]
    pub fn new(y: &Matrix, p: &Matrix) -> Self {
        Self {
            y: y.clone(),
            p: p.clone(),
        }
    }

    /// Appends the `auc` node to `Y`'s context.
    ///
    /// Nothing is validated or computed here: label encodings, score ranges,
    /// shapes and context compatibility are left to submission time.
    #[must_use]
    pub fn build(self) -> Scalar {
        let node = NodeSpec::new(AUC.name, NodeKind::Call, AUC.output)
            .named(AUC.params[0], &self.y)
            .named(AUC.params[1], &self.p)
            .characteristics(DataCharacteristics::scalar())
            .build(self.y.context());
        Scalar::from_node(node)
    }
}

/// Area under the ROC curve of binary classifier scores.
///
/// `y` holds the binary labels and `p` the predicted scores for the true
/// class, aligned index by index. Returns a lazy scalar; call
/// [`Scalar::compute`] to run it.
#[must_use]
pub fn auc(y: &Matrix, p: &Matrix) -> Scalar {
    AucInputs::new(y, p).build()
}
