use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, trace};

use super::expression::grow;
use super::{EnvRef, Environment, EvalError, EvalResult, Expression, Procedure};

/// Names the evaluator matches before any lookup. They cannot be rebound.
pub const SPECIAL_FORMS: [&str; 4] = ["quote", "if", "define", "lambda"];

pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name)
}

pub struct Evaluator {
    depth: usize,
    max_depth: usize,
    output: Box<dyn Write>,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("depth", &self.depth)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Evaluator {
    pub fn new(max_depth: usize) -> Self {
        Self::with_output(max_depth, Box::new(io::stdout()))
    }

    /// An evaluator whose `print` writes to `output` instead of stdout.
    pub fn with_output(max_depth: usize, output: Box<dyn Write>) -> Self {
        Self {
            depth: 0,
            max_depth,
            output,
        }
    }

    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    pub(crate) fn reset(&mut self) {
        self.depth = 0;
    }

    pub fn eval(&mut self, exp: &Expression, env: &EnvRef) -> EvalResult {
        if self.depth >= self.max_depth {
            return Err(EvalError::RecursionLimit(self.max_depth));
        }

        self.depth += 1;
        let result = grow(|| self.eval_expression(exp, env));
        self.depth -= 1;
        result
    }

    fn eval_expression(&mut self, exp: &Expression, env: &EnvRef) -> EvalResult {
        let items = match exp {
            Expression::Symbol(name) => return env.borrow().lookup(name),
            Expression::List(items) => items,
            _ => return Ok(exp.clone()),
        };

        let (head, rest) = match items.split_first() {
            Some(split) => split,
            None => return Ok(Expression::nil()),
        };

        match head {
            Expression::Symbol(name) if name == "quote" => self.eval_quote(rest),
            Expression::Symbol(name) if name == "if" => self.eval_if(rest, env),
            Expression::Symbol(name) if name == "define" => self.eval_define(rest, env),
            Expression::Symbol(name) if name == "lambda" => self.eval_lambda(rest, env),
            _ => {
                let callee = self.eval(head, env)?;
                let args = rest
                    .iter()
                    .map(|arg| self.eval(arg, env))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.apply(&callee, args)
            },
        }
    }

    fn eval_quote(&mut self, rest: &[Expression]) -> EvalResult {
        match rest {
            [exp] => Ok(exp.clone()),
            _ => Err(malformed("quote", "(quote expression)")),
        }
    }

    fn eval_if(&mut self, rest: &[Expression], env: &EnvRef) -> EvalResult {
        match rest {
            [test, consequent, alternative] => {
                let branch = if self.eval(test, env)?.is_truthy() {
                    consequent
                } else {
                    alternative
                };
                self.eval(branch, env)
            },
            _ => Err(malformed("if", "(if test consequent alternative)")),
        }
    }

    fn eval_define(&mut self, rest: &[Expression], env: &EnvRef) -> EvalResult {
        let (name, exp) = match rest {
            [Expression::Symbol(name), exp] => (name, exp),
            _ => return Err(malformed("define", "(define name expression)")),
        };
        if is_special_form(name) {
            return Err(reserved(name));
        }

        let value = self.eval(exp, env)?;
        debug!("define {} = {}", name, value);
        env.borrow_mut().define(name, value);
        Ok(Expression::Unspecified)
    }

    fn eval_lambda(&mut self, rest: &[Expression], env: &EnvRef) -> EvalResult {
        let (params, body) = match rest {
            [Expression::List(params), body] => (params, body),
            _ => return Err(malformed("lambda", "(lambda (params...) body)")),
        };

        let mut seen = HashSet::new();
        let params = params
            .iter()
            .map(|param| match param {
                Expression::Symbol(name) if is_special_form(name) => Err(reserved(name)),
                Expression::Symbol(name) if !seen.insert(name.as_str()) => Err(EvalError::Syntax(
                    format!("duplicate parameter `{}` in lambda", name),
                )),
                Expression::Symbol(name) => Ok(name.clone()),
                other => Err(EvalError::Syntax(format!(
                    "lambda parameter must be a symbol, got {}",
                    other
                ))),
            })
            .collect::<EvalResult<Vec<_>>>()?;

        Ok(Expression::Procedure(Rc::new(Procedure {
            params,
            body: body.clone(),
            env: env.clone(),
        })))
    }

    /// Calls a builtin or a closure with already evaluated arguments.
    pub fn apply(&mut self, callee: &Expression, args: Vec<Expression>) -> EvalResult {
        match callee {
            Expression::Builtin(builtin) => {
                builtin.arity.check(&builtin.name, args.len())?;
                (builtin.func)(self, &args)
            },
            Expression::Procedure(procedure) => {
                trace!("apply {} to {} argument(s)", callee, args.len());
                let frame = Environment::with_outer(
                    callee,
                    &procedure.params,
                    args,
                    procedure.env.clone(),
                )?;
                self.eval(&procedure.body, &frame.into_ref())
            },
            other => Err(EvalError::NotAProcedure(other.to_string())),
        }
    }
}

fn malformed(form: &str, shape: &str) -> EvalError {
    EvalError::Syntax(format!("malformed `{}`, expected {}", form, shape))
}

fn reserved(name: &str) -> EvalError {
    EvalError::Syntax(format!("`{}` is a special form and cannot be rebound", name))
}
