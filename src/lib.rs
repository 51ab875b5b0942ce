#[macro_use]
mod model;
pub use model::*;

mod interpreter;
pub use interpreter::{Config, Interpreter, DEFAULT_MAX_DEPTH};

mod parser;
pub use parser::{parse, parse_all};

mod expression;
pub use expression::{Arity, Builtin, BuiltinFn, EvalResult, Expression, Procedure};

mod environment;
pub use environment::{EnvRef, Environment};

mod evaluator;
pub use evaluator::{is_special_form, Evaluator, SPECIAL_FORMS};

mod builtin;
pub use builtin::builtin;

mod lexer;
pub use lexer::{tokenize, Lexer};

mod processor;
pub use processor::Processor;
