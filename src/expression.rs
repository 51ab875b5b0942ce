use std::fmt;
use std::rc::Rc;

use super::{EnvRef, EvalError, Evaluator};

pub type EvalResult<T = Expression> = std::result::Result<T, EvalError>;

pub type BuiltinFn = fn(&mut Evaluator, &[Expression]) -> EvalResult;

const RED_ZONE: usize = 128 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Runs `f` on a fresh stack segment when the current one is nearly used up.
pub(crate) fn grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}

#[derive(Debug)]
pub enum Expression {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Symbol(String),
    List(Vec<Expression>),
    Procedure(Rc<Procedure>),
    Builtin(Builtin),
    /// Result of `define` and `print`; never printed by the driver.
    Unspecified,
}

/// A user-defined closure.
pub struct Procedure {
    pub params: Vec<String>,
    pub body: Expression,
    pub env: EnvRef,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: BuiltinFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(expected) => n == expected,
            Arity::AtLeast(min) => n >= min,
            Arity::Between(min, max) => min <= n && n <= max,
        }
    }

    pub fn check(&self, callee: &dyn fmt::Display, found: usize) -> EvalResult<()> {
        if self.accepts(found) {
            Ok(())
        } else {
            Err(EvalError::Arity {
                callee: callee.to_string(),
                expected: *self,
                found,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

impl Expression {
    /// Classifies a single token. Integers win over floats, so `3` stays exact.
    pub fn atom(token: &str) -> Expression {
        if let Ok(i) = token.parse::<i64>() {
            return Expression::Integer(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Expression::Float(f);
        }
        match token {
            "#t" => Expression::Boolean(true),
            "#f" => Expression::Boolean(false),
            _ => Expression::Symbol(token.to_string()),
        }
    }

    pub fn symbol(name: &str) -> Expression {
        Expression::Symbol(name.to_string())
    }

    pub fn nil() -> Expression {
        Expression::List(vec![])
    }

    /// Only `#f` and the empty list are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Expression::Boolean(b) => *b,
            Expression::List(items) => !items.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Expression::Procedure(_) | Expression::Builtin(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Expression::Integer(_) => "integer",
            Expression::Float(_) => "float",
            Expression::Boolean(_) => "boolean",
            Expression::Symbol(_) => "symbol",
            Expression::List(_) => "list",
            Expression::Procedure(_) | Expression::Builtin(_) => "procedure",
            Expression::Unspecified => "unspecified",
        }
    }
}

impl Clone for Expression {
    fn clone(&self) -> Self {
        match self {
            Expression::Integer(i) => Expression::Integer(*i),
            Expression::Float(x) => Expression::Float(*x),
            Expression::Boolean(b) => Expression::Boolean(*b),
            Expression::Symbol(name) => Expression::Symbol(name.clone()),
            Expression::List(items) => grow(|| Expression::List(items.clone())),
            Expression::Procedure(procedure) => Expression::Procedure(procedure.clone()),
            Expression::Builtin(builtin) => Expression::Builtin(*builtin),
            Expression::Unspecified => Expression::Unspecified,
        }
    }
}

impl Drop for Expression {
    fn drop(&mut self) {
        if let Expression::List(items) = self {
            if !items.is_empty() {
                let items = std::mem::take(items);
                grow(move || drop(items));
            }
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expression::Integer(a), Expression::Integer(b)) => a == b,
            (Expression::Float(a), Expression::Float(b)) => a == b,
            (Expression::Boolean(a), Expression::Boolean(b)) => a == b,
            (Expression::Symbol(a), Expression::Symbol(b)) => a == b,
            (Expression::List(a), Expression::List(b)) => grow(|| a == b),
            (Expression::Procedure(a), Expression::Procedure(b)) => Rc::ptr_eq(a, b),
            (Expression::Builtin(a), Expression::Builtin(b)) => a.name == b.name,
            (Expression::Unspecified, Expression::Unspecified) => true,
            _ => false,
        }
    }
}

// The captured frame usually holds the procedure itself, so it is left out.
impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(i) => write!(f, "{}", i),
            // Debug keeps the `.0` so the text reads back as a float
            Expression::Float(x) => write!(f, "{:?}", x),
            Expression::Boolean(true) => f.write_str("#t"),
            Expression::Boolean(false) => f.write_str("#f"),
            Expression::Symbol(name) => f.write_str(name),
            Expression::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    grow(|| write!(f, "{}", item))?;
                }
                f.write_str(")")
            },
            Expression::Procedure(procedure) => {
                write!(f, "#<procedure ({})>", procedure.params.join(" "))
            },
            Expression::Builtin(builtin) => write!(f, "#<builtin {}>", builtin.name),
            Expression::Unspecified => Ok(()),
        }
    }
}

#[test]
fn atom_classification() {
    assert_eq!(Expression::atom("3"), Expression::Integer(3));
    assert_eq!(Expression::atom("-17"), Expression::Integer(-17));
    assert_eq!(Expression::atom("3.0"), Expression::Float(3.0));
    assert_eq!(Expression::atom("1e3"), Expression::Float(1000.0));
    assert_eq!(Expression::atom(".5"), Expression::Float(0.5));
    assert_eq!(Expression::atom("#t"), Expression::Boolean(true));
    assert_eq!(Expression::atom("#f"), Expression::Boolean(false));
    assert_eq!(Expression::atom("+"), Expression::symbol("+"));
    assert_eq!(Expression::atom("null?"), Expression::symbol("null?"));
    assert_eq!(Expression::atom("1+"), Expression::symbol("1+"));
    // too wide for i64, still a number
    assert_eq!(
        Expression::atom("99999999999999999999"),
        Expression::Float(99999999999999999999.0)
    );
}

#[test]
fn truthiness() {
    assert!(!Expression::nil().is_truthy());
    assert!(!Expression::Boolean(false).is_truthy());
    assert!(Expression::Boolean(true).is_truthy());
    assert!(Expression::Integer(0).is_truthy());
    assert!(Expression::Float(0.0).is_truthy());
    assert!(Expression::List(vec![Expression::nil()]).is_truthy());
}

#[test]
fn render() {
    let exp = Expression::List(vec![
        Expression::symbol("+"),
        Expression::Integer(1),
        Expression::List(vec![Expression::Float(2.0), Expression::Boolean(true)]),
        Expression::nil(),
    ]);
    assert_eq!(exp.to_string(), "(+ 1 (2.0 #t) ())");
    assert_eq!(Expression::Float(-0.25).to_string(), "-0.25");
    assert_eq!(Expression::Unspecified.to_string(), "");
}
