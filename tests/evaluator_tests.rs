// tests/evaluator_tests.rs

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bindexpr::{EvalError, Scope, ScopeRef, Value, parse_expr, scope_of};

fn eval(source: &str, scope: &Value) -> Result<Value, EvalError> {
    parse_expr(source).unwrap().evaluate(&scope_of(scope))
}

fn state(pairs: Vec<(&str, Value)>) -> Value {
    Value::object(pairs)
}

fn ints(values: &[i64]) -> Value {
    Value::array(values.iter().map(|&n| Value::Integer(n)).collect())
}

fn empty() -> Value {
    state(vec![])
}

fn boom() -> Value {
    Value::function(|_, _| Err(EvalError::native("boom")))
}

fn is_nan(v: &Value) -> bool {
    matches!(v, Value::Float(n) if n.is_nan())
}

/// Scope that records every name it is asked for.
struct RecordingScope {
    inner: Value,
    reads: RefCell<Vec<String>>,
}

impl Scope for RecordingScope {
    fn get(&self, name: &str) -> Value {
        self.reads.borrow_mut().push(name.to_string());
        self.inner.get_property(name)
    }

    fn set(&self, name: &str, value: Value) {
        self.inner.set_property(name, value)
    }

    fn this_value(&self) -> Value {
        self.inner.clone()
    }
}

// ============================================================================
// Literals and Arithmetic
// ============================================================================

#[test]
fn test_literals() {
    let s = empty();
    assert_eq!(eval("42", &s).unwrap(), Value::Integer(42));
    assert_eq!(eval("3.5", &s).unwrap(), Value::Float(3.5));
    assert_eq!(eval("'hi'", &s).unwrap(), Value::from("hi"));
    assert_eq!(eval("true", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("null", &s).unwrap(), Value::Null);
    assert_eq!(eval("undefined", &s).unwrap(), Value::Undefined);
}

#[test]
fn test_arithmetic() {
    let s = empty();
    assert_eq!(eval("2 + 3 * 4", &s).unwrap(), Value::from(14));
    assert_eq!(eval("(2 + 3) * 4", &s).unwrap(), Value::from(20));
    assert_eq!(eval("10 - 4 / 2", &s).unwrap(), Value::from(8));
    assert_eq!(eval("7 / 2", &s).unwrap(), Value::Float(3.5));
    assert_eq!(eval("7 % 3", &s).unwrap(), Value::from(1));
    assert_eq!(eval("0.1 + 0.2 + 1", &s).unwrap().as_float().map(|f| (f * 10.0).round()), Some(13.0));
}

#[test]
fn test_mixed_arithmetic_is_decimal() {
    let s = empty();
    // Integer/float pairs are computed exactly, unlike IEEE doubles
    assert_eq!(eval("3 * 1.1", &s).unwrap(), Value::Float(3.3));
    assert_eq!(eval("3 * 1.1 === 3.3", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("2 * 1.5", &s).unwrap(), Value::Integer(3));
    // Float/float pairs stay IEEE
    assert_eq!(eval("0.1 + 0.2 === 0.3", &s).unwrap(), Value::Boolean(false));
}

#[test]
fn test_addition_coercions() {
    let s = state(vec![("items", ints(&[1, 2]))]);
    assert_eq!(eval("'a' + 1", &s).unwrap(), Value::from("a1"));
    assert_eq!(eval("1 + '2'", &s).unwrap(), Value::from("12"));
    assert_eq!(eval("items + ''", &s).unwrap(), Value::from("1,2"));
    assert_eq!(eval("1 + true", &s).unwrap(), Value::from(2));
    assert_eq!(eval("null + 1", &s).unwrap(), Value::from(1));
    assert!(is_nan(&eval("undefined + 1", &s).unwrap()));
}

#[test]
fn test_unary() {
    let s = state(vec![("x", Value::from("3")), ("flag", Value::from(0))]);
    assert_eq!(eval("-x", &s).unwrap(), Value::from(-3));
    assert_eq!(eval("!flag", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("!!flag", &s).unwrap(), Value::Boolean(false));
    assert_eq!(eval("-(-5)", &s).unwrap(), Value::from(5));
}

// ============================================================================
// Comparison and Equality
// ============================================================================

#[test]
fn test_comparisons() {
    let s = empty();
    assert_eq!(eval("'b' > 'a'", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("'10' < '9'", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("2 < '10'", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("3 >= 3.0", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("undefined < 1", &s).unwrap(), Value::Boolean(false));
}

#[test]
fn test_equality() {
    let s = state(vec![("a", ints(&[1]))]);
    assert_eq!(eval("1 == '1'", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("1 === '1'", &s).unwrap(), Value::Boolean(false));
    assert_eq!(eval("1 !== '1'", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("null == undefined", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("null === undefined", &s).unwrap(), Value::Boolean(false));
    assert_eq!(eval("a === a", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("[1] === [1]", &s).unwrap(), Value::Boolean(false));
    assert_eq!(eval("1 === 1.0", &s).unwrap(), Value::Boolean(true));
}

// ============================================================================
// Logical Operators
// ============================================================================

#[test]
fn test_logical_operators_return_operands() {
    let s = empty();
    assert_eq!(eval("0 || 5", &s).unwrap(), Value::from(5));
    assert_eq!(eval("'' && 5", &s).unwrap(), Value::from(""));
    assert_eq!(eval("null ?? 5", &s).unwrap(), Value::from(5));
    assert_eq!(eval("0 ?? 5", &s).unwrap(), Value::from(0));
}

#[test]
fn test_short_circuit_skips_right_side() {
    let s = state(vec![("boom", boom())]);
    assert_eq!(eval("false && boom()", &s).unwrap(), Value::Boolean(false));
    assert_eq!(eval("true || boom()", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("1 ?? boom()", &s).unwrap(), Value::from(1));
    assert!(eval("true && boom()", &s).is_err());
}

#[test]
fn test_short_circuit_does_not_read_right_side() {
    let recording = Rc::new(RecordingScope {
        inner: state(vec![("a", Value::from(false))]),
        reads: RefCell::new(vec![]),
    });
    let scope: ScopeRef = recording.clone();

    let result = parse_expr("a && b").unwrap().evaluate(&scope).unwrap();
    assert_eq!(result, Value::Boolean(false));
    assert_eq!(*recording.reads.borrow(), vec!["a".to_string()]);
}

// ============================================================================
// Member Access
// ============================================================================

#[test]
fn test_member_access() {
    let s = state(vec![
        ("user", state(vec![("name", Value::from("Ada"))])),
        ("items", ints(&[10, 20, 30])),
        ("key", Value::from("name")),
    ]);
    assert_eq!(eval("user.name", &s).unwrap(), Value::from("Ada"));
    assert_eq!(eval("user[key]", &s).unwrap(), Value::from("Ada"));
    assert_eq!(eval("items[1]", &s).unwrap(), Value::from(20));
    assert_eq!(eval("items.length", &s).unwrap(), Value::from(3));
    assert_eq!(eval("items['length']", &s).unwrap(), Value::from(3));
    assert_eq!(eval("'abc'[1]", &s).unwrap(), Value::from("b"));
    assert_eq!(eval("user.name.length", &s).unwrap(), Value::from(3));
}

#[test]
fn test_access_through_nullish_receiver() {
    let s = state(vec![("obj", Value::Null), ("boom", boom())]);
    assert_eq!(eval("obj.prop", &s).unwrap(), Value::Undefined);
    assert_eq!(eval("missing.deep.chain", &s).unwrap(), Value::Undefined);
    // The index argument is never evaluated
    assert_eq!(eval("obj[boom()]", &s).unwrap(), Value::Undefined);
    assert_eq!(eval("obj.method()", &s).unwrap(), Value::Undefined);
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assignment_mutates_scope() {
    let s = state(vec![("count", Value::from(1))]);
    assert_eq!(eval("count = 5", &s).unwrap(), Value::from(5));
    assert_eq!(s.get_property("count"), Value::from(5));

    assert_eq!(eval("count = count + 1", &s).unwrap(), Value::from(6));
    assert_eq!(s.get_property("count"), Value::from(6));

    assert_eq!(eval("(count) = 0", &s).unwrap(), Value::from(0));
    assert_eq!(s.get_property("count"), Value::from(0));
}

#[test]
fn test_assignment_through_members() {
    let user = state(vec![("name", Value::from("Ada"))]);
    let s = state(vec![("user", user.clone()), ("items", ints(&[1, 2]))]);

    eval("user.name = 'Grace'", &s).unwrap();
    assert_eq!(user.get_property("name"), Value::from("Grace"));

    eval("items[1] = 'x'", &s).unwrap();
    assert_eq!(eval("items[1]", &s).unwrap(), Value::from("x"));

    eval("user['age'] = 36", &s).unwrap();
    assert_eq!(user.get_property("age"), Value::from(36));
}

#[test]
fn test_assignment_to_nullish_receiver_is_a_no_op() {
    let s = state(vec![("obj", Value::Undefined)]);
    assert_eq!(eval("obj.x = 1", &s).unwrap(), Value::Undefined);
    assert_eq!(eval("missing[0] = 1", &s).unwrap(), Value::Undefined);
}

#[test]
fn test_invalid_assignment_targets() {
    let s = state(vec![("a", Value::from(1)), ("b", Value::from(2))]);
    assert!(matches!(
        eval("1 = 2", &s),
        Err(EvalError::InvalidAssignmentTarget { .. })
    ));
    assert!(matches!(
        eval("a + b = 1", &s),
        Err(EvalError::InvalidAssignmentTarget { .. })
    ));
    assert!(matches!(
        eval("this = 1", &s),
        Err(EvalError::InvalidAssignmentTarget { .. })
    ));
    // `(x = y) = 3`: the inner assignment is not a target
    assert!(matches!(
        eval("a = b = 3", &s),
        Err(EvalError::InvalidAssignmentTarget { .. })
    ));
}

#[test]
fn test_invalid_target_rejected_before_right_side_runs() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let bump = Value::function(move |_, _| {
        counter.set(counter.get() + 1);
        Ok(Value::from(1))
    });
    let s = state(vec![("bump", bump), ("a", Value::from(1))]);

    for source in ["1 = bump()", "(a + 1) = bump()", "this = bump()"] {
        assert!(
            matches!(eval(source, &s), Err(EvalError::InvalidAssignmentTarget { .. })),
            "Failed for input: {}",
            source
        );
    }
    assert_eq!(calls.get(), 0);

    eval("a = bump()", &s).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_far_array_index_write_is_ignored() {
    let s = state(vec![("a", ints(&[1]))]);
    assert_eq!(eval("a[1000000000000000000] = 1", &s).unwrap(), Value::from(1));
    assert_eq!(eval("a[10000000000] = 1", &s).unwrap(), Value::from(1));
    assert_eq!(eval("a.length", &s).unwrap(), Value::from(1));

    // Near the end the array still grows, padding with undefined
    eval("a[3] = 4", &s).unwrap();
    assert_eq!(eval("a.length", &s).unwrap(), Value::from(4));
    assert_eq!(eval("a[2]", &s).unwrap(), Value::Undefined);
}

#[test]
fn test_self_containing_array() {
    let s = state(vec![("a", ints(&[1]))]);
    eval("a.push(a)", &s).unwrap();

    assert_eq!(eval("a + ''", &s).unwrap(), Value::from("1,"));
    assert_eq!(eval("a.join('-')", &s).unwrap(), Value::from("1-"));
    assert_eq!(eval("a == '1,'", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("a[1] === a", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("a.length", &s).unwrap(), Value::from(2));
}

// ============================================================================
// Calls
// ============================================================================

#[test]
fn test_host_function_calls() {
    let double = Value::function(|_, args| match args.first() {
        Some(Value::Integer(n)) => Ok(Value::Integer(n * 2)),
        _ => Ok(Value::Undefined),
    });
    let s = state(vec![("double", double)]);
    assert_eq!(eval("double(5)", &s).unwrap(), Value::from(10));
    assert_eq!(eval("double(double(2))", &s).unwrap(), Value::from(8));
}

#[test]
fn test_method_receives_receiver_as_this() {
    let greet = Value::function(|this, _| Ok(this.get_property("name")));
    let who = Value::function(|this, _| Ok(this.clone()));
    let s = state(vec![
        ("obj", state(vec![("name", Value::from("Ada")), ("greet", greet)])),
        ("who", who),
    ]);
    assert_eq!(eval("obj.greet()", &s).unwrap(), Value::from("Ada"));
    // Free calls have no receiver
    assert_eq!(eval("who()", &s).unwrap(), Value::Undefined);
}

#[test]
fn test_arguments_evaluate_left_to_right() {
    let collect = Value::function(|_, args| Ok(Value::array(args.to_vec())));
    let s = state(vec![("f", collect), ("x", Value::from(0))]);
    assert_eq!(eval("f(x = 1, x = x + 1)", &s).unwrap(), ints(&[1, 2]));
}

#[test]
fn test_calling_non_callables_yields_undefined() {
    let s = state(vec![("count", Value::from(1)), ("obj", empty())]);
    assert_eq!(eval("count()", &s).unwrap(), Value::Undefined);
    assert_eq!(eval("nothing()", &s).unwrap(), Value::Undefined);
    assert_eq!(eval("obj.nope()", &s).unwrap(), Value::Undefined);
}

#[test]
fn test_host_errors_propagate() {
    let s = state(vec![("boom", boom())]);
    assert_eq!(eval("boom()", &s), Err(EvalError::Native("boom".to_string())));
}

// ============================================================================
// Built-in Methods
// ============================================================================

#[test]
fn test_string_methods() {
    let s = state(vec![("name", Value::from("Ada")), ("csv", Value::from("a,b,c"))]);
    assert_eq!(eval("name.toUpperCase()", &s).unwrap(), Value::from("ADA"));
    assert_eq!(eval("'  a '.trim().toUpperCase()", &s).unwrap(), Value::from("A"));
    assert_eq!(eval("name.includes('d')", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("name.indexOf('a')", &s).unwrap(), Value::from(2));
    assert_eq!(eval("csv.split(',').length", &s).unwrap(), Value::from(3));
    assert_eq!(eval("name.slice(1)", &s).unwrap(), Value::from("da"));
    assert_eq!(eval("name.charAt(0)", &s).unwrap(), Value::from("A"));
}

#[test]
fn test_array_methods() {
    let s = state(vec![
        ("items", ints(&[1, 2, 3])),
        ("a", Value::from(1)),
        ("b", Value::from(2)),
    ]);
    assert_eq!(eval("items.includes(2)", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("items.map(i => i * 2)", &s).unwrap(), ints(&[2, 4, 6]));
    assert_eq!(eval("items.filter(i => i > 1).length", &s).unwrap(), Value::from(2));
    assert_eq!(eval("items.find(i => i > 1)", &s).unwrap(), Value::from(2));
    assert_eq!(eval("items.some(i => i > 2)", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("items.every(i => i > 2)", &s).unwrap(), Value::Boolean(false));
    assert_eq!(eval("items.join('-')", &s).unwrap(), Value::from("1-2-3"));
    assert_eq!(eval("items.concat([4], 5).length", &s).unwrap(), Value::from(5));
    assert_eq!(eval("[a, b].pop()", &s).unwrap(), Value::from(2));
}

#[test]
fn test_push_mutates_array_in_scope() {
    let s = state(vec![("items", ints(&[1]))]);
    assert_eq!(eval("items.push(2)", &s).unwrap(), Value::from(2));
    assert_eq!(s.get_property("items"), ints(&[1, 2]));
}

#[test]
fn test_number_and_object_methods() {
    let s = state(vec![("obj", state(vec![("a", Value::from(1))]))]);
    assert_eq!(eval("(1.23456).toFixed(2)", &s).unwrap(), Value::from("1.23"));
    assert_eq!(eval("(42).toString()", &s).unwrap(), Value::from("42"));
    assert_eq!(eval("obj.hasOwnProperty('a')", &s).unwrap(), Value::Boolean(true));
    assert_eq!(eval("obj.hasOwnProperty('b')", &s).unwrap(), Value::Boolean(false));
}

#[test]
fn test_builtin_type_errors() {
    let s = state(vec![("items", ints(&[1]))]);
    assert!(matches!(eval("items.map(5)", &s), Err(EvalError::TypeError(_))));
}

// ============================================================================
// Ternary, Lists and Maps
// ============================================================================

#[test]
fn test_ternary_evaluates_one_branch() {
    let s = state(vec![("a", Value::from(1)), ("boom", boom())]);
    assert_eq!(eval("a ? 'yes' : boom()", &s).unwrap(), Value::from("yes"));
    assert_eq!(eval("!a ? boom() : 'no'", &s).unwrap(), Value::from("no"));
}

#[test]
fn test_nested_ternary() {
    let grade = |score: i64| {
        let s = state(vec![("s", Value::from(score))]);
        eval("s > 90 ? 'A' : s > 80 ? 'B' : 'C'", &s).unwrap()
    };
    assert_eq!(grade(95), Value::from("A"));
    assert_eq!(grade(85), Value::from("B"));
    assert_eq!(grade(10), Value::from("C"));
}

#[test]
fn test_list_and_map_literals_keep_order() {
    let s = state(vec![("x", Value::from(7))]);
    assert_eq!(
        eval("[1, x, 'a']", &s).unwrap(),
        Value::array(vec![Value::from(1), Value::from(7), Value::from("a")])
    );

    let map = eval("{b: 1, a: x}", &s).unwrap();
    let Value::Object(entries) = &map else {
        panic!("expected object, got {:?}", map);
    };
    let keys: Vec<String> = entries.borrow().keys().cloned().collect();
    assert_eq!(keys, vec!["b", "a"]);
    assert_eq!(map.get_property("a"), Value::from(7));
}

// ============================================================================
// Arrow Functions
// ============================================================================

#[test]
fn test_arrow_function_call() {
    let s = empty();
    assert_eq!(eval("((a, b) => a + b)(3, 4)", &s).unwrap(), Value::from(7));
    assert_eq!(eval("((a, b) => b)(1)", &s).unwrap(), Value::Undefined);
}

#[test]
fn test_arrow_function_stored_in_scope() {
    let s = state(vec![("multiplier", Value::from(2))]);
    eval("scale = x => x * multiplier", &s).unwrap();
    assert_eq!(eval("scale(5)", &s).unwrap(), Value::from(10));

    // Closures see the scope as it is when called
    s.set_property("multiplier", Value::from(3));
    assert_eq!(eval("scale(5)", &s).unwrap(), Value::from(15));
}

#[test]
fn test_stored_closure_does_not_keep_scope_alive() {
    let s = state(vec![("x", Value::from(1))]);
    eval("handler = () => x", &s).unwrap();
    assert_eq!(eval("handler()", &s).unwrap(), Value::from(1));

    let handler = s.get_property("handler");
    let weak = s.downgrade().unwrap();
    drop(s);
    assert!(weak.upgrade().is_none());

    // Outliving its scope, the closure reads undefined
    let Value::Function(f) = &handler else {
        panic!("expected a function");
    };
    assert_eq!(f.call(&Value::Undefined, &[]).unwrap(), Value::Undefined);
}

#[test]
fn test_closure_returned_from_closure() {
    let s = state(vec![("base", Value::from(10))]);
    eval("make = a => b => a + b + base", &s).unwrap();
    eval("add1 = make(1)", &s).unwrap();
    assert_eq!(eval("add1(2)", &s).unwrap(), Value::from(13));

    let weak = s.downgrade().unwrap();
    drop(s);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_parameter_writes_stay_local() {
    let s = state(vec![("items", ints(&[1, 2, 3])), ("total", Value::from(0))]);

    eval("items.forEach(x => x = 0)", &s).unwrap();
    assert_eq!(s.get_property("items"), ints(&[1, 2, 3]));
    assert_eq!(s.get_property("x"), Value::Undefined);

    eval("items.forEach(i => total = total + i)", &s).unwrap();
    assert_eq!(s.get_property("total"), Value::from(6));
}

#[test]
fn test_parameters_shadow_outer_names() {
    let s = state(vec![("x", Value::from(100))]);
    assert_eq!(eval("(x => x + 1)(1)", &s).unwrap(), Value::from(2));
    assert_eq!(eval("(y => x + y)(1)", &s).unwrap(), Value::from(101));
}

// ============================================================================
// this
// ============================================================================

#[test]
fn test_this_and_empty_expression() {
    let s = state(vec![("count", Value::from(3))]);
    assert_eq!(eval("this", &s).unwrap(), s);
    assert_eq!(eval("", &s).unwrap(), s);
    assert_eq!(eval("this.count", &s).unwrap(), Value::from(3));
    // Arrow functions see the outer `this`
    assert_eq!(eval("(() => this.count)()", &s).unwrap(), Value::from(3));
}

// ============================================================================
// Free Identifiers
// ============================================================================

fn free(source: &str) -> Vec<String> {
    parse_expr(source).unwrap().free_identifiers().into_iter().collect()
}

#[test]
fn test_free_identifiers() {
    assert_eq!(free("a + b.c"), vec!["a", "b"]);
    assert_eq!(free("items[index]"), vec!["items"]);
    assert_eq!(free("f(x, y.z)"), vec!["f", "x", "y"]);
    assert_eq!(free("cond ? yes : no"), vec!["cond", "yes", "no"]);
    assert_eq!(free("{k: v, list: [w]}"), vec!["v", "w"]);
    assert_eq!(free("this.count"), vec!["this"]);
    assert!(free("1 + 'a'").is_empty());
}

#[test]
fn test_free_identifiers_keep_first_seen_order() {
    assert_eq!(free("z + a + z + m"), vec!["z", "a", "m"]);
}

#[test]
fn test_arrow_parameters_are_not_free() {
    assert_eq!(free("x => x * multiplier"), vec!["multiplier"]);
    assert_eq!(free("items.map(i => i.price * rate)"), vec!["items", "rate"]);
    assert_eq!(free("a => b => a + b + c"), vec!["c"]);
    // A name bound inside the arrow stays free outside it
    assert_eq!(free("a + (a => a)(1)"), vec!["a"]);
}
