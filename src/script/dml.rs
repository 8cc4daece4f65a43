//! Generated DML programs.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ContextId;
use crate::dag::OutputType;
use crate::error::ValidationError;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

static IDENTIFIER: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn is_identifier(s: &str) -> bool {
    match IDENTIFIER.get_or_init(|| Regex::new(IDENTIFIER_PATTERN)) {
        Ok(re) => re.is_match(s),
        Err(_) => false,
    }
}

/// A straight-line script ready for an executor.
///
/// Every script carries:
/// - a format version for executors that persist scripts
/// - a unique id for correlating logs with engine runs
/// - the creation timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmlScript {
    /// Script format version.
    pub version: String,

    /// Unique identifier of this script.
    pub script_id: Uuid,

    /// When the script was generated.
    pub created_at: DateTime<Utc>,

    /// Context whose graph produced the script.
    pub context_id: ContextId,

    /// Assignment statements in execution order.
    pub statements: Vec<String>,

    /// Variable holding the result.
    pub output: String,

    /// Kind of value bound to `output`.
    pub output_type: OutputType,
}

impl DmlScript {
    /// Current script format version.
    pub const CURRENT_VERSION: &'static str = "1.0";

    /// Creates a script.
    #[must_use]
    pub fn new(
        context_id: ContextId,
        statements: Vec<String>,
        output: impl Into<String>,
        output_type: OutputType,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
            script_id: Uuid::new_v4(),
            created_at: Utc::now(),
            context_id,
            statements,
            output: output.into(),
            output_type,
        }
    }

    /// Program source, one statement per line.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = self.statements.join("\n");
        text.push('\n');
        text
    }

    /// Stable content hash of the program source (hex).
    ///
    /// Two scripts built from structurally equal graphs share a fingerprint
    /// even though their ids and timestamps differ.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.text().as_bytes());
        hasher.update(self.output.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Checks structural well-formedness of a deserialized script.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "version".to_string(),
            });
        }
        if self.statements.is_empty() {
            return Err(ValidationError::MissingField {
                field: "statements".to_string(),
            });
        }
        if !is_identifier(&self.output) {
            return Err(ValidationError::InvalidIdentifier {
                field: "output".to_string(),
                value: self.output.clone(),
            });
        }
        Ok(())
    }
}
