use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use tracing::debug;

use crate::evaluator::EvalError;

/// Interior-mutable, reference-counted handle. Arrays and objects are shared
/// this way so that `obj.count = 1` mutates the caller's object, not a copy.
pub type Shared<T> = Rc<RefCell<T>>;

/// Ordered property map backing [`Value::Object`].
pub type Object = IndexMap<String, Value>;

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, EvalError>;

/// How far past the end an index write may grow an array. Writes further out
/// are dropped instead of allocating the gap.
pub const MAX_ARRAY_GAP: usize = 1 << 16;

/// A callable value: either supplied by the host through the scope, or the
/// closure produced by evaluating an arrow function.
///
/// The first argument of the underlying closure is the call target (`this`),
/// which is the receiver for method calls and undefined for free calls.
///
/// # Ownership
///
/// Arrow closures hold the object or array they were evaluated against only
/// weakly, so `handler = () => x` stored back into its own scope does not keep
/// that scope alive. Once the host drops the scope, a closure still reads its
/// own parameters but every other name reads as undefined and writes are
/// dropped. Host functions own whatever they capture; a host function that
/// captures the scope it is stored in is a cycle the host has to break.
#[derive(Clone)]
pub struct Function {
    call: Rc<NativeFn>,
}

impl Function {
    pub fn new(f: impl Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static) -> Self {
        Function { call: Rc::new(f) }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
        (self.call)(this, args)
    }

    /// Identity comparison; two functions are equal only if they are the same closure.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Function]")
    }
}

/// A dynamically typed runtime value.
///
/// Mirrors the value domain of the JavaScript expressions it evaluates, while
/// keeping integers and floats apart the way the arithmetic rules need:
/// - Integer arithmetic stays integral while results are exact
/// - Mixed integer/float arithmetic goes through decimals and collapses back to
///   an integer when the result is whole
/// - Numbers compare equal across the two representations (`1 == 1.0`)
///
/// # Examples
///
/// ```
/// use bindexpr::Value;
///
/// let scope = Value::object([
///     ("count", Value::from(1)),
///     ("name", Value::from("Ada")),
///     ("tags", Value::array(vec![Value::from("a"), Value::from("b")])),
/// ]);
/// assert_eq!(scope.get_property("count"), Value::Integer(1));
/// assert_eq!(scope.get_property("missing"), Value::Undefined);
/// ```
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,

    /// Explicit null
    Null,

    Boolean(bool),

    Integer(i64),

    Float(f64),

    String(String),

    /// Array, shared by reference
    Array(Shared<Vec<Value>>),

    /// Object with insertion-ordered keys, shared by reference
    Object(Shared<Object>),

    Function(Function),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map: Object = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    pub fn function(f: impl Fn(&Value, &[Value]) -> Result<Value, EvalError> + 'static) -> Self {
        Value::Function(Function::new(f))
    }

    /// True for `null` and `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// JavaScript truthiness.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Undefined | Null => false,
            Boolean(b) => *b,
            Integer(n) => *n != 0,
            Float(n) => *n != 0.0 && !n.is_nan(),
            String(s) => !s.is_empty(),
            Array(_) | Object(_) | Function(_) => true,
        }
    }

    /// Returns a human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Get as float, without coercion
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer, accepting whole floats
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(*n as i64),
            _ => None,
        }
    }

    /// Numeric coercion (`ToNumber`). Returns `Integer` or `Float`; anything
    /// that does not read as a number becomes `NaN`.
    pub fn to_numeric(&self) -> Value {
        match self {
            Value::Integer(_) | Value::Float(_) => self.clone(),
            Value::Null => Value::Integer(0),
            Value::Boolean(b) => Value::Integer(*b as i64),
            Value::Undefined | Value::Function(_) => Value::Float(f64::NAN),
            Value::String(s) => parse_numeric(s),
            Value::Array(_) | Value::Object(_) => parse_numeric(&self.as_string()),
        }
    }

    /// Numeric coercion as a plain float.
    pub fn to_number(&self) -> f64 {
        self.to_numeric().as_float().unwrap_or(f64::NAN)
    }

    /// String coercion (`ToString`), used for concatenation.
    pub fn as_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => join_array(items, ","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(_) => "function () { [native code] }".to_string(),
        }
    }

    /// Reads a named property. Missing properties, and any property of a
    /// primitive without one, read as undefined.
    pub fn get_property(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.borrow().get(key).cloned().unwrap_or_default(),
            Value::Array(items) => {
                let items = items.borrow();
                if key == "length" {
                    return Value::Integer(items.len() as i64);
                }
                array_index(key)
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default()
            }
            Value::String(s) => {
                if key == "length" {
                    return Value::Integer(s.chars().count() as i64);
                }
                array_index(key)
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default()
            }
            _ => Value::Undefined,
        }
    }

    /// Reads a computed property (`receiver[key]`).
    pub fn get_index(&self, key: &Value) -> Value {
        match (self, key.as_int()) {
            (Value::Array(items), Some(i)) if key.is_number() => usize::try_from(i)
                .ok()
                .and_then(|i| items.borrow().get(i).cloned())
                .unwrap_or_default(),
            _ => self.get_property(&key_string(key)),
        }
    }

    /// Writes a named property. Writes to primitives are ignored.
    pub fn set_property(&self, key: &str, value: Value) {
        match self {
            Value::Object(map) => {
                map.borrow_mut().insert(key.to_string(), value);
            }
            Value::Array(items) => {
                let Some(i) = array_index(key) else {
                    return;
                };
                let mut items = items.borrow_mut();
                let len = items.len();
                if i < len {
                    items[i] = value;
                } else if i - len <= MAX_ARRAY_GAP && items.try_reserve(i + 1 - len).is_ok() {
                    items.resize(i + 1, Value::Undefined);
                    items[i] = value;
                } else {
                    debug!(index = i, len, "array write too far past the end, ignored");
                }
            }
            _ => {}
        }
    }

    /// Writes a computed property (`receiver[key] = value`).
    pub fn set_index(&self, key: &Value, value: Value) {
        self.set_property(&key_string(key), value)
    }

    /// Weak handle to a shared array or object; `None` for everything else.
    pub fn downgrade(&self) -> Option<WeakValue> {
        match self {
            Value::Array(items) => Some(WeakValue::Array(Rc::downgrade(items))),
            Value::Object(map) => Some(WeakValue::Object(Rc::downgrade(map))),
            _ => None,
        }
    }
}

/// A [`Value`] container that does not keep its contents alive.
#[derive(Debug, Clone)]
pub enum WeakValue {
    Array(Weak<RefCell<Vec<Value>>>),
    Object(Weak<RefCell<Object>>),
}

impl WeakValue {
    pub fn upgrade(&self) -> Option<Value> {
        match self {
            WeakValue::Array(items) => items.upgrade().map(Value::Array),
            WeakValue::Object(map) => map.upgrade().map(Value::Object),
        }
    }
}

/// Joins array elements the way `Array.prototype.join` does. Nullish elements
/// print as empty, and so does an array that is already being joined further
/// up, which keeps self-containing arrays finite.
pub fn join_array(items: &Shared<Vec<Value>>, separator: &str) -> String {
    join_items(items, separator, &mut Vec::new())
}

fn join_items(items: &Shared<Vec<Value>>, separator: &str, seen: &mut Vec<*const ()>) -> String {
    let ptr = Rc::as_ptr(items) as *const ();
    if seen.contains(&ptr) {
        return String::new();
    }
    seen.push(ptr);
    let parts: Vec<String> = items
        .borrow()
        .iter()
        .map(|v| match v {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(inner) => join_items(inner, ",", seen),
            other => other.as_string(),
        })
        .collect();
    seen.pop();
    parts.join(separator)
}

/// Canonical array index form: digits only, no leading zeros.
fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Property key form of a value (`obj[1]` and `obj['1']` are the same slot).
fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.as_string(),
    }
}

fn parse_numeric(s: &str) -> Value {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Value::Integer(0);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Integer(n);
    }
    match trimmed {
        "Infinity" | "+Infinity" => Value::Float(f64::INFINITY),
        "-Infinity" => Value::Float(f64::NEG_INFINITY),
        // Rust accepts "inf" and "nan" spellings that JavaScript does not
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            Value::Float(f64::NAN)
        }
        t => Value::Float(t.parse::<f64>().unwrap_or(f64::NAN)),
    }
}

/// Formats a float the way JavaScript prints numbers.
pub fn format_float(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    /// Structural equality for tests and host code. Numbers compare by value
    /// across representations; functions compare by identity. A pair of
    /// containers met again while comparing them counts as equal.
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, &mut Vec::new())
    }
}

fn structural_eq(left: &Value, right: &Value, seen: &mut Vec<(*const (), *const ())>) -> bool {
    use Value::*;
    match (left, right) {
        (Undefined, Undefined) | (Null, Null) => true,
        (Boolean(a), Boolean(b)) => a == b,
        (Integer(a), Integer(b)) => a == b,
        (Integer(_) | Float(_), Integer(_) | Float(_)) => left.as_float() == right.as_float(),
        (String(a), String(b)) => a == b,
        (Array(a), Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if seen.contains(&pair) {
                return true;
            }
            seen.push(pair);
            let (a, b) = (a.borrow(), b.borrow());
            let equal = a.len() == b.len()
                && a.iter().zip(b.iter()).all(|(x, y)| structural_eq(x, y, seen));
            seen.pop();
            equal
        }
        (Object(a), Object(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
            if seen.contains(&pair) {
                return true;
            }
            seen.push(pair);
            let (a, b) = (a.borrow(), b.borrow());
            let equal = a.len() == b.len()
                && a.iter().all(|(k, x)| b.get(k).is_some_and(|y| structural_eq(x, y, seen)));
            seen.pop();
            equal
        }
        (Function(a), Function(b)) => a.ptr_eq(b),
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}
