use crate::{
    evaluator::{
        EvalError,
        operators::{same_value_zero, strict_equals},
    },
    value::{Function, Shared, Value, format_float, join_array},
};

/// Calls a built-in method on `receiver`.
///
/// Only reached when the receiver has no own property with that name. Unknown
/// methods yield undefined, like calling any other non-callable member.
pub fn call_builtin(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match receiver {
        Value::String(s) => string_method(s, method, args),
        Value::Array(items) => array_method(receiver, items, method, args),
        Value::Integer(_) | Value::Float(_) => number_method(receiver, method, args),
        Value::Object(map) => match method {
            "hasOwnProperty" => {
                let key = arg(args, 0).as_string();
                Ok(Value::Boolean(map.borrow().contains_key(&key)))
            }
            "toString" => Ok(Value::String(receiver.as_string())),
            _ => Ok(Value::Undefined),
        },
        Value::Boolean(_) if method == "toString" => Ok(Value::String(receiver.as_string())),
        _ => Ok(Value::Undefined),
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Resolves a possibly negative position argument against `len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    match value {
        None | Some(Value::Undefined) => default,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() {
                0
            } else if n < 0.0 {
                (len as f64 + n.trunc()).max(0.0) as usize
            } else {
                (n.trunc() as usize).min(len)
            }
        }
    }
}

fn callback(method: &str, args: &[Value]) -> Result<Function, EvalError> {
    match args.first() {
        Some(Value::Function(f)) => Ok(f.clone()),
        other => Err(EvalError::TypeError(format!(
            ".{}() requires a function argument, got {}",
            method,
            other.map_or("undefined", Value::type_name)
        ))),
    }
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    let result = match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "toString" => Value::String(s.to_string()),
        "includes" => Value::Boolean(s.contains(&arg(args, 0).as_string())),
        "startsWith" => Value::Boolean(s.starts_with(&arg(args, 0).as_string())),
        "endsWith" => Value::Boolean(s.ends_with(&arg(args, 0).as_string())),
        "indexOf" => {
            let needle = arg(args, 0).as_string();
            let index = s
                .find(&needle)
                .map_or(-1, |byte| s[..byte].chars().count() as i64);
            Value::Integer(index)
        }
        "charAt" => {
            let i = arg(args, 0).as_int().unwrap_or(0);
            let ch = usize::try_from(i).ok().and_then(|i| s.chars().nth(i));
            Value::String(ch.map(String::from).unwrap_or_default())
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let start = relative_index(args.first(), chars.len(), 0);
            let end = relative_index(args.get(1), chars.len(), chars.len());
            let sliced: String = if start < end { chars[start..end].iter().collect() } else { String::new() };
            Value::String(sliced)
        }
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::from(s)],
                Some(sep) => {
                    let sep = sep.as_string();
                    if sep.is_empty() {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Value::array(parts)
        }
        _ => Value::Undefined,
    };
    Ok(result)
}

fn array_method(
    receiver: &Value,
    items: &Shared<Vec<Value>>,
    method: &str,
    args: &[Value],
) -> Result<Value, EvalError> {
    // Work on a snapshot so callbacks are free to mutate the array
    let snapshot = || items.borrow().clone();

    let result = match method {
        "includes" => {
            let needle = arg(args, 0);
            Value::Boolean(items.borrow().iter().any(|v| same_value_zero(v, &needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let index = items.borrow().iter().position(|v| strict_equals(v, &needle));
            Value::Integer(index.map_or(-1, |i| i as i64))
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.as_string(),
            };
            Value::String(join_array(items, &separator))
        }
        "toString" => Value::String(receiver.as_string()),
        "push" => {
            let mut items = items.borrow_mut();
            items.extend(args.iter().cloned());
            Value::Integer(items.len() as i64)
        }
        "pop" => items.borrow_mut().pop().unwrap_or_default(),
        "reverse" => {
            items.borrow_mut().reverse();
            receiver.clone()
        }
        "slice" => {
            let items = items.borrow();
            let start = relative_index(args.first(), items.len(), 0);
            let end = relative_index(args.get(1), items.len(), items.len());
            Value::array(if start < end { items[start..end].to_vec() } else { vec![] })
        }
        "concat" => {
            let mut joined = snapshot();
            for value in args {
                match value {
                    Value::Array(other) => joined.extend(other.borrow().iter().cloned()),
                    other => joined.push(other.clone()),
                }
            }
            Value::array(joined)
        }
        "map" => {
            let f = callback(method, args)?;
            let mapped = snapshot()
                .into_iter()
                .enumerate()
                .map(|(i, item)| f.call(&Value::Undefined, &[item, Value::from(i as i64), receiver.clone()]))
                .collect::<Result<Vec<_>, _>>()?;
            Value::array(mapped)
        }
        "filter" => {
            let f = callback(method, args)?;
            let mut kept = vec![];
            for (i, item) in snapshot().into_iter().enumerate() {
                let test = f.call(&Value::Undefined, &[item.clone(), Value::from(i as i64), receiver.clone()])?;
                if test.is_truthy() {
                    kept.push(item);
                }
            }
            Value::array(kept)
        }
        "find" => {
            let f = callback(method, args)?;
            let mut found = Value::Undefined;
            for (i, item) in snapshot().into_iter().enumerate() {
                let test = f.call(&Value::Undefined, &[item.clone(), Value::from(i as i64), receiver.clone()])?;
                if test.is_truthy() {
                    found = item;
                    break;
                }
            }
            found
        }
        "some" | "every" => {
            let f = callback(method, args)?;
            let want = method == "some";
            let mut outcome = !want;
            for (i, item) in snapshot().into_iter().enumerate() {
                let test = f.call(&Value::Undefined, &[item, Value::from(i as i64), receiver.clone()])?;
                if test.is_truthy() == want {
                    outcome = want;
                    break;
                }
            }
            Value::Boolean(outcome)
        }
        "forEach" => {
            let f = callback(method, args)?;
            for (i, item) in snapshot().into_iter().enumerate() {
                f.call(&Value::Undefined, &[item, Value::from(i as i64), receiver.clone()])?;
            }
            Value::Undefined
        }
        _ => Value::Undefined,
    };
    Ok(result)
}

fn number_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    match method {
        "toString" => Ok(Value::String(receiver.as_string())),
        "toFixed" => {
            let digits = arg(args, 0).as_int().unwrap_or(0);
            if !(0..=100).contains(&digits) {
                return Err(EvalError::TypeError(format!(
                    ".toFixed() digits argument must be between 0 and 100, got {}",
                    digits
                )));
            }
            let n = receiver.as_float().unwrap_or(f64::NAN);
            Ok(Value::String(to_fixed(n, digits as usize)))
        }
        _ => Ok(Value::Undefined),
    }
}

/// Fixed-point formatting with JavaScript's rounding: to nearest, and an exact
/// tie goes to the larger magnitude (`(2.5).toFixed(0)` is `"3"`).
fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return format_float(n);
    }
    let n = if n == 0.0 { 0.0 } else { n };

    // Every finite f64 has at most 1074 fractional digits
    let exact = format!("{:.1074}", n);
    let exact = exact.trim_end_matches('0');
    let is_tie = exact
        .split_once('.')
        .is_some_and(|(_, fraction)| fraction.len() == digits + 1 && fraction.ends_with('5'));
    if !is_tie {
        return format!("{:.*}", digits, n);
    }

    let truncated = exact[..exact.len() - 1].trim_end_matches('.');
    round_up_magnitude(truncated)
}

/// Adds one unit in the last place to a decimal string, ignoring its sign.
fn round_up_magnitude(digits: &str) -> String {
    let mut bytes = digits.as_bytes().to_vec();
    for b in bytes.iter_mut().rev() {
        match *b {
            b'9' => *b = b'0',
            b'0'..=b'8' => {
                *b += 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
            _ => {}
        }
    }
    // Carried past the leading digit
    let at = usize::from(bytes.first() == Some(&b'-'));
    bytes.insert(at, b'1');
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_slice_negative() {
        let r = call_builtin(&Value::from("hello"), "slice", &[Value::from(-3)]).unwrap();
        assert_eq!(r, Value::from("llo"));
    }

    #[test]
    fn test_push_returns_length() {
        let arr = Value::array(vec![Value::from(1)]);
        let r = call_builtin(&arr, "push", &[Value::from(2), Value::from(3)]).unwrap();
        assert_eq!(r, Value::Integer(3));
        assert_eq!(arr.get_property("length"), Value::Integer(3));
    }

    #[test]
    fn test_map_requires_function() {
        let arr = Value::array(vec![Value::from(1)]);
        let err = call_builtin(&arr, "map", &[Value::from(1)]).unwrap_err();
        assert!(matches!(err, EvalError::TypeError(_)));
    }

    #[test]
    fn test_to_fixed() {
        let r = call_builtin(&Value::Float(1.23456), "toFixed", &[Value::from(2)]).unwrap();
        assert_eq!(r, Value::from("1.23"));
    }

    #[test]
    fn test_to_fixed_ties_round_away_from_zero() {
        let cases = [
            (2.5, 0, "3"),
            (0.5, 0, "1"),
            (-2.5, 0, "-3"),
            (1.25, 1, "1.3"),
            (9.5, 0, "10"),
            (-9.95, 1, "-9.9"),
            (99.5, 0, "100"),
            (1.005, 2, "1.00"),
            (-0.0, 2, "0.00"),
        ];
        for (n, digits, expected) in cases {
            let r = call_builtin(&Value::Float(n), "toFixed", &[Value::from(digits)]).unwrap();
            assert_eq!(r, Value::from(expected), "Failed for {}.toFixed({})", n, digits);
        }
    }

    #[test]
    fn test_join_self_containing_array() {
        let arr = Value::array(vec![Value::from(1)]);
        call_builtin(&arr, "push", &[arr.clone()]).unwrap();
        let r = call_builtin(&arr, "join", &[Value::from("-")]).unwrap();
        assert_eq!(r, Value::from("1-"));
    }
}
