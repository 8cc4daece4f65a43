//! Script serialization helpers.
//!
//! Serde already provides JSON serialization. This module centralizes the
//! helpers used by executors that ship scripts across process boundaries.

use crate::error::DagError;

use super::DmlScript;

/// Serialize a script to pretty JSON.
pub fn to_json_pretty(script: &DmlScript) -> Result<String, DagError> {
    serde_json::to_string_pretty(script).map_err(|e| DagError::internal(format!("serialize script: {e}")))
}

/// Deserialize and validate a script from JSON.
pub fn from_json(s: &str) -> Result<DmlScript, DagError> {
    let script = serde_json::from_str::<DmlScript>(s)
        .map_err(|e| DagError::internal(format!("deserialize script: {e}")))?;
    script.validate()?;
    Ok(script)
}
