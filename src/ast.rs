//! # Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and tree nodes of the binding expression
//! language: a compact, JavaScript-flavoured expression syntax used to read
//! and update reactive state.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Binary and unary operators plus the precedence table
//! - **[expressions]** - Expression nodes and literal constants
//! - **[factory]** - The node-building interface the parser is written against
//!
//! ## Quick Start
//!
//! ```text
//! user.active ? items.filter(i => i.price > min).length : 0
//! ```
//!
//! ## Precedence
//!
//! Higher binds tighter. Operators missing from the table, including
//! assignment, bind at zero.
//!
//! ```text
//! !  :  ,  )  ]  }     0
//! ?                     2
//! ??                    3
//! ||                    4
//! &&                    5
//! == != === !==         9
//! >= > <= <             10
//! + -                   11
//! % / *                 12
//! ( [ . {               13
//! ```
pub mod expressions;
pub mod factory;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Literal};
pub use factory::{AstFactory, EvalFactory};
pub use operators::{BinOp, POSTFIX_PRECEDENCE, UnaryOp, precedence};
pub use tokens::{Token, TokenKind};
