use std::sync::Arc;

use crate::ast::{BinOp, Expr, Literal, UnaryOp};

/// Node construction capability the [`Parser`](crate::parser::Parser) is
/// written against.
///
/// The grammar never builds nodes directly, so the same parser can target any
/// tree representation. [`EvalFactory`] produces the evaluable [`Expr`] tree.
pub trait AstFactory {
    type Node;

    fn empty(&self) -> Self::Node;

    fn literal(&self, value: Literal) -> Self::Node;

    fn identifier(&self, name: &str) -> Self::Node;

    fn unary(&self, op: UnaryOp, operand: Self::Node) -> Self::Node;

    fn binary(&self, left: Self::Node, op: BinOp, right: Self::Node) -> Self::Node;

    fn getter(&self, receiver: Self::Node, name: &str) -> Self::Node;

    fn index(&self, receiver: Self::Node, argument: Self::Node) -> Self::Node;

    fn invoke(
        &self,
        receiver: Self::Node,
        method: Option<&str>,
        arguments: Vec<Self::Node>,
    ) -> Self::Node;

    fn paren(&self, inner: Self::Node) -> Self::Node;

    fn ternary(
        &self,
        condition: Self::Node,
        then_branch: Self::Node,
        else_branch: Self::Node,
    ) -> Self::Node;

    fn list(&self, items: Vec<Self::Node>) -> Self::Node;

    fn map(&self, entries: Vec<(String, Self::Node)>) -> Self::Node;

    fn arrow_function(&self, params: Vec<String>, body: Self::Node) -> Self::Node;

    /// Name of a node built by [`AstFactory::identifier`], if that is what it is.
    ///
    /// Used to reinterpret a parenthesized list as arrow parameters once `=>`
    /// shows up after the closing paren.
    fn parameter_name(&self, node: &Self::Node) -> Option<String>;
}

/// Builds [`Expr`] trees that can be evaluated and scanned for free identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvalFactory;

impl AstFactory for EvalFactory {
    type Node = Expr;

    fn empty(&self) -> Expr {
        Expr::Empty
    }

    fn literal(&self, value: Literal) -> Expr {
        Expr::Literal(value)
    }

    fn identifier(&self, name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    fn binary(&self, left: Expr, op: BinOp, right: Expr) -> Expr {
        Expr::binary(left, op, right)
    }

    fn getter(&self, receiver: Expr, name: &str) -> Expr {
        Expr::Getter {
            receiver: Box::new(receiver),
            name: name.to_string(),
        }
    }

    fn index(&self, receiver: Expr, argument: Expr) -> Expr {
        Expr::Index {
            receiver: Box::new(receiver),
            argument: Box::new(argument),
        }
    }

    fn invoke(&self, receiver: Expr, method: Option<&str>, arguments: Vec<Expr>) -> Expr {
        Expr::Invoke {
            receiver: Box::new(receiver),
            method: method.map(str::to_string),
            arguments,
        }
    }

    fn paren(&self, inner: Expr) -> Expr {
        Expr::Paren(Box::new(inner))
    }

    fn ternary(&self, condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    fn list(&self, items: Vec<Expr>) -> Expr {
        Expr::List(items)
    }

    fn map(&self, entries: Vec<(String, Expr)>) -> Expr {
        Expr::Map(entries)
    }

    fn arrow_function(&self, params: Vec<String>, body: Expr) -> Expr {
        Expr::ArrowFunction {
            params,
            body: Arc::new(body),
        }
    }

    fn parameter_name(&self, node: &Expr) -> Option<String> {
        match node {
            Expr::Identifier(name) if name != "this" => Some(name.clone()),
            _ => None,
        }
    }
}
