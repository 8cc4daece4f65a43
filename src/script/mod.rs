//! Script generation.
//!
//! A graph is lowered into a straight-line DML program: one assignment per
//! node in dependency order, with the root bound to the output variable.

mod builder;
mod dml;
mod serialization;

pub use builder::ScriptBuilder;
pub use dml::DmlScript;
pub use serialization::{from_json, to_json_pretty};
