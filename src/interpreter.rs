use std::io::Write;

use log::debug;

use super::builtin::builtin;
use super::{parse_all, EnvRef, Environment, Error, EvalError, Evaluator, Expression};

pub const DEFAULT_MAX_DEPTH: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest nesting of evaluations before `RecursionLimit` is raised.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Owns the global environment and evaluates top-level forms against it.
pub struct Interpreter {
    environment: EnvRef,
    evaluator: Evaluator,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            environment: Environment::from(builtin()).into_ref(),
            evaluator: Evaluator::new(config.max_depth),
        }
    }

    /// Like `with_config`, but `print` writes to `output`.
    pub fn with_output(config: Config, output: Box<dyn Write>) -> Self {
        Self {
            environment: Environment::from(builtin()).into_ref(),
            evaluator: Evaluator::with_output(config.max_depth, output),
        }
    }

    pub fn environment(&self) -> &EnvRef {
        &self.environment
    }

    /// Evaluates one top-level form. `None` means the form produced no value.
    pub fn eval(&mut self, exp: &Expression) -> Result<Option<Expression>, EvalError> {
        debug!("eval {}", exp);
        self.evaluator.reset();
        match self.evaluator.eval(exp, &self.environment)? {
            Expression::Unspecified => Ok(None),
            value => Ok(Some(value)),
        }
    }

    /// Parses every form in `source` and evaluates them in order, returning the
    /// value of the last one. Nothing is evaluated if the text does not parse.
    pub fn run(&mut self, source: &str) -> Result<Option<Expression>, Error> {
        let mut last = None;
        for exp in parse_all(source)? {
            last = self.eval(&exp)?;
        }
        Ok(last)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
