//! CLI support for bindexpr
//!
//! Provides programmatic access to the `bindexpr` subcommands so they can be
//! embedded in other tools.

mod check;
mod convert;

pub use check::{CheckOptions, CheckResult, execute_check, list_dependencies, list_tokens};
pub use convert::{json_to_value, value_to_json};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Scope must be a JSON object
    #[error("Scope must be a JSON object, got {0}")]
    InvalidScope(&'static str),
}
