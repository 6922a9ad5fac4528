use std::{rc::Rc, sync::Arc};

use indexmap::IndexSet;
use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Literal},
    scope::{CapturedScope, ScopeLayer, ScopeRef},
    value::Value,
};

pub mod methods;
pub mod operators;

pub use operators::{apply_binary, apply_unary, compare, loose_equals, strict_equals};

/// Errors that can occur during evaluation.
///
/// Reading through a missing receiver is never an error; it yields undefined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Left side of `=` is not a name, member or index
    #[error("Invalid assignment target: {target}")]
    InvalidAssignmentTarget { target: String },

    /// Built-in method called with an argument of the wrong kind
    #[error("Type error: {0}")]
    TypeError(String),

    /// Raised by a host function supplied through the scope
    #[error("{0}")]
    Native(String),
}

impl EvalError {
    pub fn native(message: impl Into<String>) -> Self {
        EvalError::Native(message.into())
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(n) => Value::Integer(*n),
            Literal::Float(n) => Value::Float(*n),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl Expr {
    /// Evaluates the tree against `scope`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bindexpr::{Value, parse_expr, scope_of};
    ///
    /// let expr = parse_expr("count = count + step").unwrap();
    /// let state = Value::object([("count", Value::from(1)), ("step", Value::from(2))]);
    ///
    /// let result = expr.evaluate(&scope_of(&state)).unwrap();
    /// assert_eq!(result, Value::Integer(3));
    /// assert_eq!(state.get_property("count"), Value::Integer(3));
    /// ```
    pub fn evaluate(&self, scope: &ScopeRef) -> Result<Value, EvalError> {
        match self {
            Expr::Empty => Ok(scope.this_value()),
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Identifier(name) if name == "this" => Ok(scope.this_value()),
            Expr::Identifier(name) => Ok(scope.get(name)),
            Expr::Unary { op, operand } => Ok(apply_unary(*op, &operand.evaluate(scope)?)),
            Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, scope),
            Expr::Getter { receiver, name } => {
                let receiver = receiver.evaluate(scope)?;
                Ok(receiver.get_property(name))
            }
            Expr::Index { receiver, argument } => {
                let receiver = receiver.evaluate(scope)?;
                if receiver.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = argument.evaluate(scope)?;
                Ok(receiver.get_index(&key))
            }
            Expr::Invoke {
                receiver,
                method,
                arguments,
            } => evaluate_invoke(receiver, method.as_deref(), arguments, scope),
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if condition.evaluate(scope)?.is_truthy() {
                    then_branch.evaluate(scope)
                } else {
                    else_branch.evaluate(scope)
                }
            }
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| item.evaluate(scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(values))
            }
            Expr::Map(entries) => {
                let values = entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), value.evaluate(scope)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                Ok(Value::object(values))
            }
            Expr::ArrowFunction { params, body } => Ok(closure(params, body, scope)),
            Expr::Paren(inner) => inner.evaluate(scope),
        }
    }

    /// Adds every name this tree reads from its scope to `ids`, in first-seen
    /// order.
    ///
    /// Member names and index arguments are not dependencies, only the
    /// receivers they hang off. Arrow-function parameters are bound locally and
    /// therefore excluded.
    pub fn collect_free_identifiers(&self, ids: &mut IndexSet<String>) {
        match self {
            Expr::Empty | Expr::Literal(_) => {}
            Expr::Identifier(name) => {
                ids.insert(name.clone());
            }
            Expr::Unary { operand, .. } => operand.collect_free_identifiers(ids),
            Expr::Binary { left, right, .. } => {
                left.collect_free_identifiers(ids);
                right.collect_free_identifiers(ids);
            }
            Expr::Getter { receiver, .. } | Expr::Index { receiver, .. } => {
                receiver.collect_free_identifiers(ids)
            }
            Expr::Invoke {
                receiver,
                arguments,
                ..
            } => {
                receiver.collect_free_identifiers(ids);
                for argument in arguments {
                    argument.collect_free_identifiers(ids);
                }
            }
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_free_identifiers(ids);
                then_branch.collect_free_identifiers(ids);
                else_branch.collect_free_identifiers(ids);
            }
            Expr::List(items) => {
                for item in items {
                    item.collect_free_identifiers(ids);
                }
            }
            Expr::Map(entries) => {
                for (_, value) in entries {
                    value.collect_free_identifiers(ids);
                }
            }
            Expr::ArrowFunction { params, body } => {
                let mut inner = IndexSet::new();
                body.collect_free_identifiers(&mut inner);
                ids.extend(inner.into_iter().filter(|name| !params.contains(name)));
            }
            Expr::Paren(inner) => inner.collect_free_identifiers(ids),
        }
    }

    /// Free identifiers of the tree as a fresh set.
    pub fn free_identifiers(&self) -> IndexSet<String> {
        let mut ids = IndexSet::new();
        self.collect_free_identifiers(&mut ids);
        ids
    }
}

fn evaluate_binary(
    op: BinOp,
    left: &Expr,
    right: &Expr,
    scope: &ScopeRef,
) -> Result<Value, EvalError> {
    match op {
        BinOp::Assign => {
            // The target's shape is checked before the right side runs
            let target = assignment_target(left)?;
            let value = right.evaluate(scope)?;
            assign(target, value, scope)
        }
        BinOp::And => {
            let l = left.evaluate(scope)?;
            if l.is_truthy() { right.evaluate(scope) } else { Ok(l) }
        }
        BinOp::Or => {
            let l = left.evaluate(scope)?;
            if l.is_truthy() { Ok(l) } else { right.evaluate(scope) }
        }
        BinOp::NullCoalesce => {
            let l = left.evaluate(scope)?;
            if l.is_nullish() { right.evaluate(scope) } else { Ok(l) }
        }
        _ => {
            let l = left.evaluate(scope)?;
            let r = right.evaluate(scope)?;
            Ok(apply_binary(op, &l, &r))
        }
    }
}

/// The left side of `=` with parentheses stripped, if it can be written to.
fn assignment_target(left: &Expr) -> Result<&Expr, EvalError> {
    let target = left.unparenthesized();
    match target {
        Expr::Identifier(name) if name == "this" => Err(EvalError::InvalidAssignmentTarget {
            target: name.clone(),
        }),
        Expr::Identifier(_) | Expr::Getter { .. } | Expr::Index { .. } => Ok(target),
        other => Err(EvalError::InvalidAssignmentTarget {
            target: other.kind_name().to_string(),
        }),
    }
}

/// Writes `value` through an already validated `target` and returns it.
fn assign(target: &Expr, value: Value, scope: &ScopeRef) -> Result<Value, EvalError> {
    match target {
        Expr::Identifier(name) => {
            scope.set(name, value.clone());
            Ok(value)
        }
        Expr::Getter { receiver, name } => {
            let receiver = receiver.evaluate(scope)?;
            if receiver.is_nullish() {
                return Ok(Value::Undefined);
            }
            receiver.set_property(name, value.clone());
            Ok(value)
        }
        Expr::Index { receiver, argument } => {
            let receiver = receiver.evaluate(scope)?;
            if receiver.is_nullish() {
                return Ok(Value::Undefined);
            }
            let key = argument.evaluate(scope)?;
            receiver.set_index(&key, value.clone());
            Ok(value)
        }
        other => Err(EvalError::InvalidAssignmentTarget {
            target: other.kind_name().to_string(),
        }),
    }
}

fn evaluate_invoke(
    receiver: &Expr,
    method: Option<&str>,
    arguments: &[Expr],
    scope: &ScopeRef,
) -> Result<Value, EvalError> {
    let target = receiver.evaluate(scope)?;
    let args = arguments
        .iter()
        .map(|a| a.evaluate(scope))
        .collect::<Result<Vec<_>, _>>()?;

    match method {
        None => match &target {
            Value::Function(f) => f.call(&Value::Undefined, &args),
            _ => Ok(Value::Undefined),
        },
        Some(_) if target.is_nullish() => Ok(Value::Undefined),
        Some(name) => match target.get_property(name) {
            Value::Function(f) => f.call(&target, &args),
            Value::Undefined => methods::call_builtin(&target, name, &args),
            _ => Ok(Value::Undefined),
        },
    }
}

/// Closure value for an arrow function. Each call evaluates the shared body in
/// a fresh [`ScopeLayer`] over the scope captured here, which the closure does
/// not keep alive (see [`CapturedScope`]).
fn closure(params: &[String], body: &Arc<Expr>, scope: &ScopeRef) -> Value {
    let params = params.to_vec();
    let body = Arc::clone(body);
    let captured = CapturedScope::from(scope);
    Value::function(move |_this, args| {
        let layer: ScopeRef = Rc::new(ScopeLayer::new(&params, args, captured.clone()));
        body.evaluate(&layer)
    })
}
