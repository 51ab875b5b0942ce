use std::cmp::Ordering;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::f64::consts;
use std::io::Write;
use std::rc::Rc;

use super::expression::grow;
use super::{Arity, Builtin, BuiltinFn, EvalError, EvalResult, Evaluator, Expression};

/// The root frame's bindings: math constants and every primitive procedure.
pub fn builtin() -> HashMap<String, Expression> {
    let mut native = HashMap::new();

    native.insert(String::from("pi"), Expression::Float(consts::PI));
    native.insert(String::from("e"), Expression::Float(consts::E));
    native.insert(String::from("tau"), Expression::Float(consts::TAU));

    for &(name, arity, func) in PRIMITIVES {
        native.insert(name.to_owned(), Expression::Builtin(Builtin { name, arity, func }));
    }

    native
}

const PRIMITIVES: &[(&str, Arity, BuiltinFn)] = &[
    ("+", Arity::Exact(2), builtin_add),
    ("-", Arity::Exact(2), builtin_sub),
    ("*", Arity::Exact(2), builtin_mul),
    ("/", Arity::Exact(2), builtin_div),
    (">", Arity::Exact(2), builtin_gt),
    ("<", Arity::Exact(2), builtin_lt),
    (">=", Arity::Exact(2), builtin_ge),
    ("<=", Arity::Exact(2), builtin_le),
    ("=", Arity::Exact(2), builtin_num_eq),
    ("abs", Arity::Exact(1), builtin_abs),
    ("expt", Arity::Exact(2), builtin_expt),
    ("max", Arity::AtLeast(1), builtin_max),
    ("min", Arity::AtLeast(1), builtin_min),
    ("round", Arity::Exact(1), builtin_round),
    ("sqrt", Arity::Exact(1), builtin_sqrt),
    ("exp", Arity::Exact(1), builtin_exp),
    ("log", Arity::Between(1, 2), builtin_log),
    ("sin", Arity::Exact(1), builtin_sin),
    ("cos", Arity::Exact(1), builtin_cos),
    ("tan", Arity::Exact(1), builtin_tan),
    ("asin", Arity::Exact(1), builtin_asin),
    ("acos", Arity::Exact(1), builtin_acos),
    ("atan", Arity::Exact(1), builtin_atan),
    ("atan2", Arity::Exact(2), builtin_atan2),
    ("log10", Arity::Exact(1), builtin_log10),
    ("log2", Arity::Exact(1), builtin_log2),
    ("degrees", Arity::Exact(1), builtin_degrees),
    ("radians", Arity::Exact(1), builtin_radians),
    ("hypot", Arity::Exact(2), builtin_hypot),
    ("fmod", Arity::Exact(2), builtin_fmod),
    ("factorial", Arity::Exact(1), builtin_factorial),
    ("gcd", Arity::AtLeast(0), builtin_gcd),
    ("fabs", Arity::Exact(1), builtin_fabs),
    ("pow", Arity::Exact(2), builtin_pow),
    ("floor", Arity::Exact(1), builtin_floor),
    ("ceil", Arity::Exact(1), builtin_ceil),
    ("trunc", Arity::Exact(1), builtin_trunc),
    ("car", Arity::Exact(1), builtin_car),
    ("cdr", Arity::Exact(1), builtin_cdr),
    ("cons", Arity::Exact(2), builtin_cons),
    ("list", Arity::AtLeast(0), builtin_list),
    ("append", Arity::AtLeast(0), builtin_append),
    ("length", Arity::Exact(1), builtin_length),
    ("list?", Arity::Exact(1), builtin_is_list),
    ("null?", Arity::Exact(1), builtin_is_null),
    ("number?", Arity::Exact(1), builtin_is_number),
    ("symbol?", Arity::Exact(1), builtin_is_symbol),
    ("procedure?", Arity::Exact(1), builtin_is_procedure),
    ("boolean?", Arity::Exact(1), builtin_is_boolean),
    ("eq?", Arity::Exact(2), builtin_eq),
    ("equal?", Arity::Exact(2), builtin_equal),
    ("not", Arity::Exact(1), builtin_not),
    ("begin", Arity::AtLeast(1), builtin_begin),
    ("apply", Arity::Exact(2), builtin_apply),
    ("map", Arity::AtLeast(2), builtin_map),
    ("print", Arity::AtLeast(0), builtin_print),
];

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

fn type_error(name: &str, expected: &'static str, found: &Expression) -> EvalError {
    EvalError::PrimitiveType {
        name: name.to_string(),
        expected,
        found: format!("{} `{}`", found.type_name(), found),
    }
}

fn as_number(exp: &Expression) -> Option<Number> {
    match exp {
        Expression::Integer(i) => Some(Number::Int(*i)),
        Expression::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

fn number(name: &str, exp: &Expression) -> EvalResult<Number> {
    as_number(exp).ok_or_else(|| type_error(name, "number", exp))
}

fn integer(name: &str, exp: &Expression) -> EvalResult<i64> {
    match exp {
        Expression::Integer(i) => Ok(*i),
        other => Err(type_error(name, "integer", other)),
    }
}

fn list<'a>(name: &str, exp: &'a Expression) -> EvalResult<&'a [Expression]> {
    match exp {
        Expression::List(items) => Ok(items.as_slice()),
        other => Err(type_error(name, "list", other)),
    }
}

fn overflow(name: &str) -> EvalError {
    EvalError::Arithmetic(format!("integer overflow in `{}`", name))
}

fn arithmetic(
    name: &str,
    args: &[Expression],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult {
    match (number(name, &args[0])?, number(name, &args[1])?) {
        (Number::Int(a), Number::Int(b)) => {
            int_op(a, b).map(Expression::Integer).ok_or_else(|| overflow(name))
        },
        (a, b) => Ok(Expression::Float(float_op(a.to_f64(), b.to_f64()))),
    }
}

fn builtin_add(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    arithmetic("+", args, i64::checked_add, |a, b| a + b)
}

fn builtin_sub(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    arithmetic("-", args, i64::checked_sub, |a, b| a - b)
}

fn builtin_mul(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    arithmetic("*", args, i64::checked_mul, |a, b| a * b)
}

// True division: the quotient is always a float.
fn builtin_div(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let a = number("/", &args[0])?.to_f64();
    let b = number("/", &args[1])?.to_f64();
    if b == 0.0 {
        return Err(EvalError::Arithmetic("division by zero".to_string()));
    }
    Ok(Expression::Float(a / b))
}

fn compare(name: &str, args: &[Expression], accept: fn(Ordering) -> bool) -> EvalResult {
    let a = number(name, &args[0])?;
    let b = number(name, &args[1])?;
    Ok(Expression::Boolean(a.compare(b).map_or(false, accept)))
}

fn builtin_gt(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    compare(">", args, |o| o == Ordering::Greater)
}

fn builtin_lt(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    compare("<", args, |o| o == Ordering::Less)
}

fn builtin_ge(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    compare(">=", args, |o| o != Ordering::Less)
}

fn builtin_le(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    compare("<=", args, |o| o != Ordering::Greater)
}

fn builtin_num_eq(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    compare("=", args, |o| o == Ordering::Equal)
}

fn builtin_abs(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    match number("abs", &args[0])? {
        Number::Int(i) => i.checked_abs().map(Expression::Integer).ok_or_else(|| overflow("abs")),
        Number::Float(f) => Ok(Expression::Float(f.abs())),
    }
}

fn builtin_expt(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    match (number("expt", &args[0])?, number("expt", &args[1])?) {
        (Number::Int(base), Number::Int(power)) if power >= 0 => u32::try_from(power)
            .ok()
            .and_then(|power| base.checked_pow(power))
            .map(Expression::Integer)
            .ok_or_else(|| overflow("expt")),
        (base, power) => Ok(Expression::Float(base.to_f64().powf(power.to_f64()))),
    }
}

fn extremum(name: &str, args: &[Expression], keep: Ordering) -> EvalResult {
    let mut best = &args[0];
    let mut best_number = number(name, best)?;
    for arg in &args[1..] {
        let candidate = number(name, arg)?;
        if candidate.compare(best_number) == Some(keep) {
            best = arg;
            best_number = candidate;
        }
    }
    Ok(best.clone())
}

fn builtin_max(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    extremum("max", args, Ordering::Greater)
}

fn builtin_min(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    extremum("min", args, Ordering::Less)
}

fn to_integer(name: &str, f: f64) -> EvalResult {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(Expression::Integer(f as i64))
    } else {
        Err(EvalError::Arithmetic(format!("`{}` cannot convert {} to an integer", name, f)))
    }
}

fn rounding(name: &str, args: &[Expression], op: fn(f64) -> f64) -> EvalResult {
    match number(name, &args[0])? {
        Number::Int(i) => Ok(Expression::Integer(i)),
        Number::Float(f) => to_integer(name, op(f)),
    }
}

fn builtin_round(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    rounding("round", args, f64::round_ties_even)
}

fn builtin_floor(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    rounding("floor", args, f64::floor)
}

fn builtin_ceil(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    rounding("ceil", args, f64::ceil)
}

fn builtin_trunc(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    rounding("trunc", args, f64::trunc)
}

fn float_value(name: &str, exp: &Expression, op: fn(f64) -> f64) -> EvalResult<f64> {
    let x = number(name, exp)?.to_f64();
    let y = op(x);
    if y.is_nan() && !x.is_nan() {
        return Err(EvalError::Arithmetic(format!("math domain error in `{}`", name)));
    }
    Ok(y)
}

fn float_fn(name: &str, args: &[Expression], op: fn(f64) -> f64) -> EvalResult {
    float_value(name, &args[0], op).map(Expression::Float)
}

fn builtin_sqrt(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("sqrt", args, f64::sqrt)
}

fn builtin_exp(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("exp", args, f64::exp)
}

fn builtin_sin(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("sin", args, f64::sin)
}

fn builtin_cos(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("cos", args, f64::cos)
}

fn builtin_tan(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("tan", args, f64::tan)
}

fn builtin_asin(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("asin", args, f64::asin)
}

fn builtin_acos(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("acos", args, f64::acos)
}

fn builtin_atan(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("atan", args, f64::atan)
}

fn builtin_fabs(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("fabs", args, f64::abs)
}

fn builtin_log10(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("log10", args, f64::log10)
}

fn builtin_log2(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("log2", args, f64::log2)
}

fn builtin_degrees(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("degrees", args, f64::to_degrees)
}

fn builtin_radians(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    float_fn("radians", args, f64::to_radians)
}

fn builtin_atan2(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let y = number("atan2", &args[0])?.to_f64();
    let x = number("atan2", &args[1])?.to_f64();
    Ok(Expression::Float(y.atan2(x)))
}

fn builtin_hypot(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let x = number("hypot", &args[0])?.to_f64();
    let y = number("hypot", &args[1])?.to_f64();
    Ok(Expression::Float(x.hypot(y)))
}

// Remainder with the sign of the dividend.
fn builtin_fmod(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let x = number("fmod", &args[0])?.to_f64();
    let y = number("fmod", &args[1])?.to_f64();
    if y == 0.0 || x.is_infinite() {
        return Err(EvalError::Arithmetic("math domain error in `fmod`".to_string()));
    }
    Ok(Expression::Float(x % y))
}

fn builtin_factorial(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let n = integer("factorial", &args[0])?;
    if n < 0 {
        return Err(EvalError::Arithmetic(
            "`factorial` is not defined for negative values".to_string(),
        ));
    }
    (2..=n)
        .try_fold(1i64, |acc, k| acc.checked_mul(k))
        .map(Expression::Integer)
        .ok_or_else(|| overflow("factorial"))
}

// No arguments gives 0, the identity of gcd.
fn builtin_gcd(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let mut result: u64 = 0;
    for arg in args {
        let mut b = integer("gcd", arg)?.unsigned_abs();
        while b != 0 {
            let r = result % b;
            result = b;
            b = r;
        }
    }
    i64::try_from(result).map(Expression::Integer).map_err(|_| overflow("gcd"))
}

// Natural logarithm, or logarithm in the base given as the second argument.
fn builtin_log(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let ln = float_value("log", &args[0], f64::ln)?;
    let base = match args.get(1) {
        Some(base) => float_value("log", base, f64::ln)?,
        None => return Ok(Expression::Float(ln)),
    };
    if base == 0.0 {
        return Err(EvalError::Arithmetic("division by zero".to_string()));
    }
    Ok(Expression::Float(ln / base))
}

fn builtin_pow(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let base = number("pow", &args[0])?.to_f64();
    let power = number("pow", &args[1])?.to_f64();
    Ok(Expression::Float(base.powf(power)))
}

fn builtin_car(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    match list("car", &args[0])?.first() {
        Some(first) => Ok(first.clone()),
        None => Err(type_error("car", "non-empty list", &args[0])),
    }
}

fn builtin_cdr(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let items = list("cdr", &args[0])?;
    Ok(Expression::List(items.iter().skip(1).cloned().collect()))
}

fn builtin_cons(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let tail = list("cons", &args[1])?;
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(args[0].clone());
    items.extend_from_slice(tail);
    Ok(Expression::List(items))
}

fn builtin_list(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::List(args.to_vec()))
}

fn builtin_append(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let mut items = vec![];
    for arg in args {
        items.extend_from_slice(list("append", arg)?);
    }
    Ok(Expression::List(items))
}

fn builtin_length(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let len = list("length", &args[0])?.len();
    i64::try_from(len).map(Expression::Integer).map_err(|_| overflow("length"))
}

fn builtin_is_list(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(matches!(args[0], Expression::List(_))))
}

fn builtin_is_null(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(matches!(&args[0], Expression::List(items) if items.is_empty())))
}

fn builtin_is_number(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(matches!(args[0], Expression::Integer(_) | Expression::Float(_))))
}

fn builtin_is_symbol(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(matches!(args[0], Expression::Symbol(_))))
}

fn builtin_is_procedure(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(args[0].is_callable()))
}

fn builtin_is_boolean(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(matches!(args[0], Expression::Boolean(_))))
}

/// Identity: equal atoms, the same closure, or two empty lists.
fn is_eq(a: &Expression, b: &Expression) -> bool {
    match (a, b) {
        (Expression::List(a), Expression::List(b)) => a.is_empty() && b.is_empty(),
        (Expression::Procedure(a), Expression::Procedure(b)) => Rc::ptr_eq(a, b),
        (a, b) => a == b,
    }
}

/// Structural equality; numbers compare by value across integer and float.
fn is_equal(a: &Expression, b: &Expression) -> bool {
    match (a, b) {
        (Expression::List(a), Expression::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| grow(|| is_equal(a, b)))
        },
        _ => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => a.compare(b) == Some(Ordering::Equal),
            _ => a == b,
        },
    }
}

fn builtin_eq(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(is_eq(&args[0], &args[1])))
}

fn builtin_equal(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(is_equal(&args[0], &args[1])))
}

fn builtin_not(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(Expression::Boolean(!args[0].is_truthy()))
}

fn builtin_begin(_: &mut Evaluator, args: &[Expression]) -> EvalResult {
    Ok(args[args.len() - 1].clone())
}

fn builtin_apply(evaluator: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let items = list("apply", &args[1])?;
    evaluator.apply(&args[0], items.to_vec())
}

// Stops at the shortest list.
fn builtin_map(evaluator: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let lists = args[1..]
        .iter()
        .map(|arg| list("map", arg))
        .collect::<EvalResult<Vec<_>>>()?;
    let len = lists.iter().map(|items| items.len()).min().unwrap_or(0);

    let mut results = Vec::with_capacity(len);
    for i in 0..len {
        let row = lists.iter().map(|items| items[i].clone()).collect();
        results.push(evaluator.apply(&args[0], row)?);
    }
    Ok(Expression::List(results))
}

fn builtin_print(evaluator: &mut Evaluator, args: &[Expression]) -> EvalResult {
    let line = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(" ");
    writeln!(evaluator.output(), "{}", line).map_err(|err| EvalError::Output(err.to_string()))?;

    Ok(Expression::Unspecified)
}
