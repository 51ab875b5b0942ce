use thiserror::Error;

use super::{Located, ToLocated};
use crate::Arity;

macro_rules! located_error {
    ($arg:expr, $loc:expr) => {
        Err($arg.with_locate($loc))
    };
}

#[derive(PartialEq, Debug, Clone, Error)]
pub enum ReadError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected `)`")]
    UnexpectedClose,
}

impl ToLocated for ReadError {}

#[derive(PartialEq, Debug, Clone, Error)]
pub enum EvalError {
    #[error("unbound variable: {0}")]
    UnboundVariable(String),
    #[error("{callee}: expected {expected} argument(s), got {found}")]
    Arity {
        callee: String,
        expected: Arity,
        found: usize,
    },
    #[error("{name}: expected {expected}, got {found}")]
    PrimitiveType {
        name: String,
        expected: &'static str,
        found: String,
    },
    #[error("not a procedure: {0}")]
    NotAProcedure(String),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
    #[error("maximum recursion depth of {0} exceeded")]
    RecursionLimit(usize),
    #[error("failed to write output: {0}")]
    Output(String),
}

#[derive(PartialEq, Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] Located<ReadError>),
    #[error(transparent)]
    Eval(#[from] EvalError),
}
