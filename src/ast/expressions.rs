use std::sync::Arc;

use crate::ast::{BinOp, UnaryOp};

/// Constant carried by an [`Expr::Literal`].
///
/// Kept separate from [`Value`](crate::Value) so that trees stay `Send + Sync`
/// and can sit in a shared cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Trees are immutable once built. Evaluation only ever touches the scope it
/// is handed, never the nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Blank source text
    Empty,

    /// Constant value
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -2.5
    /// 'hello'
    /// undefined
    /// ```
    Literal(Literal),

    /// Name resolved against the scope
    ///
    /// `this` is an identifier too and resolves to the scope itself.
    Identifier(String),

    /// Prefix operation
    ///
    /// # Example
    /// ```text
    /// !done
    /// ```
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Infix operation, including assignment
    ///
    /// # Examples
    /// ```text
    /// a + b * c
    /// user.name = 'Ada'
    /// ```
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Dotted member access
    ///
    /// # Example
    /// ```text
    /// user.name
    /// ```
    Getter { receiver: Box<Expr>, name: String },

    /// Bracketed access
    ///
    /// # Examples
    /// ```text
    /// items[0]
    /// obj[key]
    /// ```
    Index {
        receiver: Box<Expr>,
        argument: Box<Expr>,
    },

    /// Call, either of a free callable or of a named method on a receiver
    ///
    /// # Examples
    /// ```text
    /// double(5)          // method: None
    /// str.trim()         // method: Some("trim")
    /// ```
    Invoke {
        receiver: Box<Expr>,
        method: Option<String>,
        arguments: Vec<Expr>,
    },

    /// Conditional
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Array literal
    List(Vec<Expr>),

    /// Object literal with entries in source order
    Map(Vec<(String, Expr)>),

    /// Arrow function
    ///
    /// The body is reference counted so that closures produced at evaluation
    /// time can hold on to it after the call that built them returns.
    ///
    /// # Examples
    /// ```text
    /// x => x * 2
    /// (a, b) => a + b
    /// ```
    ArrowFunction { params: Vec<String>, body: Arc<Expr> },

    /// Parenthesized expression; evaluates exactly like its inner node
    Paren(Box<Expr>),
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn integer(n: i64) -> Self {
        Expr::Literal(Literal::Integer(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Strips any number of [`Expr::Paren`] wrappers.
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }

    /// Short label used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Empty => "empty expression",
            Expr::Literal(_) => "literal",
            Expr::Identifier(_) => "identifier",
            Expr::Unary { .. } => "unary expression",
            Expr::Binary { .. } => "binary expression",
            Expr::Getter { .. } => "member access",
            Expr::Index { .. } => "index access",
            Expr::Invoke { .. } => "call",
            Expr::Ternary { .. } => "ternary",
            Expr::List(_) => "array literal",
            Expr::Map(_) => "object literal",
            Expr::ArrowFunction { .. } => "arrow function",
            Expr::Paren(inner) => inner.kind_name(),
        }
    }
}
