//! Builtin function bindings.
//!
//! Each builtin is a fixed-name, fixed-parameter function executed by the
//! engine. Bindings only construct graph nodes; their signatures are listed
//! in [`BUILTINS`] so validation can check named inputs before submission.

mod auc;

use crate::dag::OutputType;

pub use auc::{auc, AucInputs, AUC};

/// Name, parameters and result type of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinSignature {
    /// Function name in the script language.
    pub name: &'static str,
    /// Named parameters, in declaration order.
    pub params: &'static [&'static str],
    /// Kind of value returned.
    pub output: OutputType,
}

/// Every builtin bound by this crate.
pub const BUILTINS: &[BuiltinSignature] = &[AUC];

/// Looks up a builtin signature by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static BuiltinSignature> {
    BUILTINS.iter().find(|b| b.name == name)
}
