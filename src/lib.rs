pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod preprocess;
pub mod scope;
pub mod value;

pub use ast::{AstFactory, BinOp, EvalFactory, Expr, Literal, Token, TokenKind, UnaryOp};
pub use engine::{CompiledExpression, Engine, EngineConfig, FallbackPolicy, compile};
pub use evaluator::EvalError;
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser, parse, parse_expr};
pub use preprocess::preprocess;
pub use scope::{CapturedScope, Scope, ScopeLayer, ScopeRef, scope_of};
pub use value::{Function, Value, WeakValue};
