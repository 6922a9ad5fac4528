use std::{rc::Rc, sync::Arc};

use dashmap::DashMap;
use indexmap::IndexSet;
use tracing::{debug, trace, warn};

use crate::{
    ast::{Expr, Literal},
    evaluator::EvalError,
    parser::{ParseError, parse_expr},
    preprocess::preprocess,
    scope::ScopeRef,
    value::Value,
};

/// What [`Engine::compile`] hands back when the source does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Return the parse error
    Error,
    /// Inert expression that evaluates to the source text
    Literal,
    /// Inert expression that evaluates to undefined
    #[default]
    Undefined,
}

/// Names that never count as dependencies by default.
pub const DEFAULT_RESERVED_WORDS: [&str; 18] = [
    "null", "undefined", "true", "false", "this", "NaN", "Infinity", "Math", "console", "Object",
    "Array", "String", "Number", "Boolean", "Date", "JSON", "Map", "Set",
];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fallback: FallbackPolicy,
    /// Rewrite increments and comma sequences before parsing
    pub preprocess: bool,
    /// Removed from [`Engine::dependencies`]
    pub reserved_words: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fallback: FallbackPolicy::default(),
            preprocess: true,
            reserved_words: DEFAULT_RESERVED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// A parsed expression, ready to evaluate any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    ast: Expr,
}

impl CompiledExpression {
    pub fn new(source: impl Into<String>, ast: Expr) -> Self {
        CompiledExpression {
            source: source.into(),
            ast,
        }
    }

    /// Text the expression was compiled from, before any preprocessing.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluates against a value used as the scope.
    pub fn evaluate(&self, scope: &Value) -> Result<Value, EvalError> {
        self.evaluate_in(Rc::new(scope.clone()))
    }

    /// Evaluates against any scope implementation.
    pub fn evaluate_in(&self, scope: ScopeRef) -> Result<Value, EvalError> {
        self.ast.evaluate(&scope)
    }

    /// Evaluates, logging and swallowing any error. Failed evaluations yield
    /// undefined.
    pub fn execute(&self, scope: &Value) -> Value {
        match self.evaluate(scope) {
            Ok(value) => value,
            Err(err) => {
                warn!(source = %self.source, error = %err, "expression evaluation failed");
                Value::Undefined
            }
        }
    }

    pub fn free_identifiers(&self) -> IndexSet<String> {
        self.ast.free_identifiers()
    }
}

/// Parses `source` without preprocessing, caching or fallback.
pub fn compile(source: &str) -> Result<CompiledExpression, ParseError> {
    let ast = parse_expr(source)?;
    Ok(CompiledExpression::new(source, ast))
}

/// Compiles expressions once and hands out shared handles afterwards.
///
/// The cache is keyed by trimmed source text and is safe to use from several
/// threads.
///
/// # Examples
///
/// ```
/// use bindexpr::{Engine, Value};
///
/// let engine = Engine::default();
/// let state = Value::object([("count", Value::from(5))]);
///
/// assert_eq!(engine.evaluate("count++", &state), Value::Integer(5));
/// assert_eq!(state.get_property("count"), Value::Integer(6));
/// assert_eq!(engine.dependencies("count > limit").unwrap(), ["count", "limit"]);
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    cache: DashMap<String, Arc<CompiledExpression>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compiles `source`, or returns the cached result of an earlier call.
    ///
    /// Under [`FallbackPolicy::Error`] a parse failure is returned and nothing
    /// is cached. Under the other policies it is logged and an inert expression
    /// is cached in its place.
    pub fn compile(&self, source: &str) -> Result<Arc<CompiledExpression>, ParseError> {
        let key = source.trim();
        if let Some(hit) = self.cache.get(key) {
            trace!(source = key, "compile cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        let processed = if self.config.preprocess {
            preprocess(key)
        } else {
            key.to_string()
        };
        debug!(source = key, processed = %processed, "compiling expression");

        let compiled = match parse_expr(&processed) {
            Ok(ast) => CompiledExpression::new(key, ast),
            Err(err) => {
                let inert = match self.config.fallback {
                    FallbackPolicy::Error => return Err(err),
                    FallbackPolicy::Literal => Expr::Literal(Literal::String(key.to_string())),
                    FallbackPolicy::Undefined => Expr::Literal(Literal::Undefined),
                };
                warn!(source = key, error = %err, "failed to parse expression, using inert fallback");
                CompiledExpression::new(key, inert)
            }
        };

        let compiled = Arc::new(compiled);
        self.cache.insert(key.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Free identifiers of `source`, minus the configured reserved words.
    pub fn dependencies(&self, source: &str) -> Result<Vec<String>, ParseError> {
        let compiled = self.compile(source)?;
        Ok(compiled
            .free_identifiers()
            .into_iter()
            .filter(|name| !self.config.reserved_words.contains(name))
            .collect())
    }

    /// Compiles and executes in one step. Parse and evaluation failures both
    /// come back as undefined.
    pub fn evaluate(&self, source: &str, scope: &Value) -> Value {
        match self.compile(source) {
            Ok(compiled) => compiled.execute(scope),
            Err(err) => {
                warn!(source = source.trim(), error = %err, "failed to parse expression");
                Value::Undefined
            }
        }
    }

    /// Number of cached expressions.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
