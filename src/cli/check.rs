//! Evaluate expressions against JSON scopes

use super::{CliError, json_to_value, value_to_json};
use crate::{Engine, EngineConfig, FallbackPolicy, Lexer, ParseError, Token, Value};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// JSON object used as the scope; an empty object when absent
    pub scope: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    /// Rewrite `++`, `--` and comma sequences before parsing
    pub preprocess: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            expression: String::new(),
            scope: None,
            syntax_only: false,
            preprocess: true,
        }
    }
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated; `scope` reflects any assignments it made
    Success {
        result: serde_json::Value,
        scope: serde_json::Value,
    },
}

fn strict_engine(preprocess: bool) -> Engine {
    Engine::new(EngineConfig {
        fallback: FallbackPolicy::Error,
        preprocess,
        ..EngineConfig::default()
    })
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let engine = strict_engine(options.preprocess);
    let compiled = engine.compile(&options.expression)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let scope = match &options.scope {
        Some(json) => {
            let parsed: serde_json::Value = serde_json::from_str(json)?;
            match json_to_value(parsed) {
                scope @ Value::Object(_) => scope,
                other => return Err(CliError::InvalidScope(other.type_name())),
            }
        }
        None => Value::object(Vec::<(String, Value)>::new()),
    };

    let result = compiled.evaluate(&scope)?;
    Ok(CheckResult::Success {
        result: value_to_json(&result),
        scope: value_to_json(&scope),
    })
}

/// Dependencies of an expression, reserved words removed
pub fn list_dependencies(expression: &str, preprocess: bool) -> Result<Vec<String>, CliError> {
    Ok(strict_engine(preprocess).dependencies(expression)?)
}

/// Raw token stream of an expression
pub fn list_tokens(expression: &str) -> Result<Vec<Token>, CliError> {
    Lexer::new(expression)
        .tokenize()
        .map_err(|e| CliError::Parse(ParseError::from(e)))
}
