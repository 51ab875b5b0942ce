use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Arity, EvalError, EvalResult, Expression};

pub type EnvRef = Rc<RefCell<Environment>>;

type Bindings = HashMap<String, Expression>;

/// One frame of the lexical scope chain.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: Bindings,
    outer: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(bindings: Bindings) -> Self {
        Self {
            bindings,
            outer: None,
        }
    }

    /// Call frame for a procedure: pairs `params` with `args` positionally.
    pub fn with_outer(
        callee: &dyn fmt::Display,
        params: &[String],
        args: Vec<Expression>,
        outer: EnvRef,
    ) -> EvalResult<Self> {
        Arity::Exact(params.len()).check(callee, args.len())?;

        Ok(Self {
            bindings: params.iter().cloned().zip(args).collect(),
            outer: Some(outer),
        })
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn lookup(&self, name: &str) -> EvalResult {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }

        match self.outer {
            Some(ref outer) => outer.borrow().lookup(name),
            None => Err(EvalError::UnboundVariable(name.to_string())),
        }
    }

    /// Overwrites the innermost existing binding of `name`; a name bound
    /// nowhere is created in the root frame.
    pub fn define(&mut self, name: &str, value: Expression) {
        if let Some(slot) = self.bindings.get_mut(name) {
            *slot = value;
            return;
        }

        match self.outer {
            Some(ref outer) => outer.borrow_mut().define(name, value),
            None => {
                self.bindings.insert(name.to_string(), value);
            },
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Names bound directly in this frame, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self.bindings.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}

#[test]
fn lookup_walks_outward() {
    let mut root = HashMap::new();
    root.insert("x".to_string(), Expression::Integer(1));
    root.insert("y".to_string(), Expression::Integer(2));
    let root = Environment::from(root).into_ref();

    let child = Environment::with_outer(
        &"f",
        &["x".to_string()],
        vec![Expression::Integer(10)],
        root.clone(),
    )
    .unwrap();

    assert_eq!(child.lookup("x"), Ok(Expression::Integer(10)));
    assert_eq!(child.lookup("y"), Ok(Expression::Integer(2)));
    assert_eq!(root.borrow().lookup("x"), Ok(Expression::Integer(1)));
    assert_eq!(
        child.lookup("z"),
        Err(EvalError::UnboundVariable("z".to_string()))
    );
}

#[test]
fn define_targets_owner_or_root() {
    let root = Environment::new().into_ref();
    root.borrow_mut().define("x", Expression::Integer(1));

    let mut child = Environment::with_outer(
        &"f",
        &["a".to_string()],
        vec![Expression::Integer(0)],
        root.clone(),
    )
    .unwrap();

    // owned by the root: overwritten there
    child.define("x", Expression::Integer(2));
    assert!(!child.contains("x"));
    assert_eq!(root.borrow().lookup("x"), Ok(Expression::Integer(2)));

    // owned by the child: stays local
    child.define("a", Expression::Integer(3));
    assert_eq!(child.lookup("a"), Ok(Expression::Integer(3)));
    assert!(!root.borrow().contains("a"));

    // owned by nobody: falls through to the root
    child.define("fresh", Expression::Integer(4));
    assert!(!child.contains("fresh"));
    assert_eq!(root.borrow().lookup("fresh"), Ok(Expression::Integer(4)));
}

#[test]
fn frame_arity() {
    let root = Environment::new().into_ref();
    let err = Environment::with_outer(
        &"f",
        &["a".to_string(), "b".to_string()],
        vec![Expression::Integer(1)],
        root,
    )
    .unwrap_err();

    assert_eq!(
        err,
        EvalError::Arity {
            callee: "f".to_string(),
            expected: Arity::Exact(2),
            found: 1,
        }
    );
}
