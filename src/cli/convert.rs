//! JSON <-> Value conversion utilities

use std::rc::Rc;

use crate::Value;

/// Convert serde_json::Value to Value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            Value::object(obj.into_iter().map(|(k, v)| (k, json_to_value(v))))
        }
    }
}

/// Convert Value to serde_json::Value
///
/// JSON has no undefined, function or non-finite numbers; those become null.
/// So does an array or object that contains itself, where it recurs.
pub fn value_to_json(v: &Value) -> serde_json::Value {
    to_json(v, &mut Vec::new())
}

fn to_json(v: &Value, seen: &mut Vec<*const ()>) -> serde_json::Value {
    match v {
        Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(arr) => {
            let ptr = Rc::as_ptr(arr) as *const ();
            if seen.contains(&ptr) {
                return serde_json::Value::Null;
            }
            seen.push(ptr);
            let items = arr.borrow().iter().map(|item| to_json(item, seen)).collect();
            seen.pop();
            serde_json::Value::Array(items)
        }
        Value::Object(obj) => {
            let ptr = Rc::as_ptr(obj) as *const ();
            if seen.contains(&ptr) {
                return serde_json::Value::Null;
            }
            seen.push(ptr);
            let entries = obj
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v, seen)))
                .collect();
            seen.pop();
            serde_json::Value::Object(entries)
        }
    }
}
