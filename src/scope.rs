use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::value::{Value, WeakValue};

/// Name lookup and assignment target for evaluation.
///
/// Any [`Value`] is a scope: identifiers read and write its properties, and
/// `this` is the value itself.
pub trait Scope {
    /// Reads a name. Missing names read as undefined.
    fn get(&self, name: &str) -> Value;

    /// Writes a name.
    fn set(&self, name: &str, value: Value);

    /// What `this` and the empty expression evaluate to.
    fn this_value(&self) -> Value;

    /// Weak handle for closures to hold in place of the scope. `None` makes
    /// closures keep the scope itself alive.
    fn weak_handle(&self) -> Option<WeakValue> {
        None
    }
}

/// Shared handle to a scope, cloned into closures created by arrow functions.
pub type ScopeRef = Rc<dyn Scope>;

impl Scope for Value {
    fn get(&self, name: &str) -> Value {
        self.get_property(name)
    }

    fn set(&self, name: &str, value: Value) {
        self.set_property(name, value)
    }

    fn this_value(&self) -> Value {
        self.clone()
    }

    fn weak_handle(&self) -> Option<WeakValue> {
        self.downgrade()
    }
}

/// Wraps a value so it can be handed to [`Expr::evaluate`](crate::Expr::evaluate).
pub fn scope_of(value: &Value) -> ScopeRef {
    Rc::new(value.clone())
}

/// The scope an arrow closure was created in.
///
/// Objects and arrays are held weakly so that a closure stored into its own
/// scope does not form a reference cycle. A dead scope reads as undefined and
/// ignores writes.
#[derive(Clone)]
pub enum CapturedScope {
    Strong(ScopeRef),
    Weak(WeakValue),
}

impl CapturedScope {
    pub fn upgrade(&self) -> Option<ScopeRef> {
        match self {
            CapturedScope::Strong(scope) => Some(Rc::clone(scope)),
            CapturedScope::Weak(weak) => weak.upgrade().map(|value| Rc::new(value) as ScopeRef),
        }
    }
}

impl From<ScopeRef> for CapturedScope {
    fn from(scope: ScopeRef) -> Self {
        match scope.weak_handle() {
            Some(weak) => CapturedScope::Weak(weak),
            None => CapturedScope::Strong(scope),
        }
    }
}

impl From<&ScopeRef> for CapturedScope {
    fn from(scope: &ScopeRef) -> Self {
        CapturedScope::from(Rc::clone(scope))
    }
}

impl Scope for CapturedScope {
    fn get(&self, name: &str) -> Value {
        match self {
            CapturedScope::Strong(scope) => scope.get(name),
            CapturedScope::Weak(weak) => weak
                .upgrade()
                .map(|target| target.get_property(name))
                .unwrap_or_default(),
        }
    }

    fn set(&self, name: &str, value: Value) {
        match self {
            CapturedScope::Strong(scope) => scope.set(name, value),
            CapturedScope::Weak(weak) => {
                if let Some(target) = weak.upgrade() {
                    target.set_property(name, value);
                }
            }
        }
    }

    fn this_value(&self) -> Value {
        match self {
            CapturedScope::Strong(scope) => scope.this_value(),
            CapturedScope::Weak(weak) => weak.upgrade().unwrap_or_default(),
        }
    }
}

/// Parameter bindings of one arrow-function call, layered over the scope the
/// function was created in.
///
/// Parameters shadow the parent for reads and writes. Every other name goes
/// straight to the parent.
pub struct ScopeLayer {
    bindings: RefCell<IndexMap<String, Value>>,
    parent: CapturedScope,
}

impl ScopeLayer {
    /// Binds `params` positionally to `args`; missing arguments are undefined.
    pub fn new(params: &[String], args: &[Value], parent: impl Into<CapturedScope>) -> Self {
        let bindings = params
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), args.get(i).cloned().unwrap_or_default()))
            .collect();
        ScopeLayer {
            bindings: RefCell::new(bindings),
            parent: parent.into(),
        }
    }
}

impl Scope for ScopeLayer {
    fn get(&self, name: &str) -> Value {
        if let Some(value) = self.bindings.borrow().get(name) {
            return value.clone();
        }
        self.parent.get(name)
    }

    fn set(&self, name: &str, value: Value) {
        let mut bindings = self.bindings.borrow_mut();
        if let Some(slot) = bindings.get_mut(name) {
            *slot = value;
            return;
        }
        drop(bindings);
        self.parent.set(name, value)
    }

    fn this_value(&self) -> Value {
        self.parent.this_value()
    }
}
