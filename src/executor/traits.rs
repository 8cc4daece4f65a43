//! Executor trait and engine results.

use serde::{Deserialize, Serialize};

use crate::dag::DenseMatrix;
use crate::error::ExecutionError;
use crate::script::DmlScript;

/// A value returned by the engine for a script's output variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EngineValue {
    /// Scalar result.
    Scalar(f64),

    /// Matrix result.
    Matrix(DenseMatrix),

    /// The script produced no output.
    Empty,
}

impl EngineValue {
    /// Short kind name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Matrix(_) => "matrix",
            Self::Empty => "empty",
        }
    }

    /// Returns the scalar, or an error naming what was returned instead.
    pub fn into_scalar(self) -> Result<f64, ExecutionError> {
        match self {
            Self::Scalar(v) => Ok(v),
            other => Err(ExecutionError::UnexpectedOutput {
                expected: "scalar".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }

    /// Returns the matrix, or an error naming what was returned instead.
    pub fn into_matrix(self) -> Result<DenseMatrix, ExecutionError> {
        match self {
            Self::Matrix(m) => Ok(m),
            other => Err(ExecutionError::UnexpectedOutput {
                expected: "matrix".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }
}

/// Runs generated scripts.
///
/// Implementations own all numerical work: shape compatibility, label
/// encodings and value ranges are theirs to check and report.
pub trait ScriptExecutor: Send + Sync {
    /// Executes a script and returns the value bound to its output variable.
    fn execute(&self, script: &DmlScript) -> Result<EngineValue, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_scalar() {
        assert_eq!(EngineValue::Scalar(0.75).into_scalar().unwrap(), 0.75);
        let err = EngineValue::Empty.into_scalar().unwrap_err();
        assert_eq!(
            err,
            ExecutionError::UnexpectedOutput {
                expected: "scalar".to_string(),
                actual: "empty".to_string(),
            }
        );
    }

    #[test]
    fn test_into_matrix() {
        let m = DenseMatrix::new(1, 2, vec![1.0, 2.0]).unwrap();
        assert_eq!(EngineValue::Matrix(m.clone()).into_matrix().unwrap(), m);
        assert!(EngineValue::Scalar(1.0).into_matrix().is_err());
    }

    #[test]
    fn test_serialization_tagging() {
        let json = serde_json::to_string(&EngineValue::Scalar(0.5)).unwrap();
        assert_eq!(json, r#"{"type":"scalar","value":0.5}"#);
    }

    #[test]
    fn test_malformed_matrix_reply_rejected() {
        let ok = r#"{"type":"matrix","value":{"rows":1,"cols":2,"values":[0.0,1.0]}}"#;
        let value: EngineValue = serde_json::from_str(ok).unwrap();
        assert_eq!(value.into_matrix().unwrap().cols(), 2);

        let bad = r#"{"type":"matrix","value":{"rows":1,"cols":1,"values":[1.0,1.0,1.0]}}"#;
        assert!(serde_json::from_str::<EngineValue>(bad).is_err());
    }
}
