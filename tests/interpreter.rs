extern crate scream;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use scream::{
    parse, Arity, Config, Error, EvalError, Expression, Interpreter, ReadError, DEFAULT_MAX_DEPTH,
};

#[test]
fn arithmetic() {
    assert_eq!(value("(+ 1 2)"), Expression::Integer(3));
    assert_eq!(value("(- 10 4)"), Expression::Integer(6));
    assert_eq!(value("(* 6 7)"), Expression::Integer(42));
    assert_eq!(value("(+ 1 2.5)"), Expression::Float(3.5));
    assert_eq!(value("(/ 6 3)"), Expression::Float(2.0));
    assert_eq!(value("(expt 2 10)"), Expression::Integer(1024));
    assert_eq!(value("(expt 2 -1)"), Expression::Float(0.5));
    assert_eq!(value("(abs -7)"), Expression::Integer(7));
    assert_eq!(value("(max 1 5.5 3)"), Expression::Float(5.5));
    assert_eq!(value("(min 4 2 8)"), Expression::Integer(2));
    assert_eq!(value("(round 2.5)"), Expression::Integer(2));
    assert_eq!(value("(round 3.5)"), Expression::Integer(4));
    assert_eq!(value("(floor 2.7)"), Expression::Integer(2));
    assert_eq!(value("(sqrt 16)"), Expression::Float(4.0));
    assert_eq!(value("(log 1)"), Expression::Float(0.0));
    assert_eq!(value("(* 2 pi)"), Expression::Float(std::f64::consts::TAU));
}

#[test]
fn arithmetic_errors() {
    assert!(matches!(eval_error("(/ 1 0)"), EvalError::Arithmetic(_)));
    assert!(matches!(eval_error("(sqrt -1)"), EvalError::Arithmetic(_)));
    assert!(matches!(
        eval_error("(* 9223372036854775807 2)"),
        EvalError::Arithmetic(_)
    ));
    assert_eq!(
        eval_error("(+ 1 (quote a))"),
        EvalError::PrimitiveType {
            name: "+".to_string(),
            expected: "number",
            found: "symbol `a`".to_string(),
        }
    );
}

#[test]
fn comparison_and_truthiness() {
    assert_eq!(value("(> 2 1)"), Expression::Boolean(true));
    assert_eq!(value("(<= 2 1)"), Expression::Boolean(false));
    assert_eq!(value("(= 1 1.0)"), Expression::Boolean(true));
    assert_eq!(value("(if (> 2 1) 10 20)"), Expression::Integer(10));
    assert_eq!(value("(if (> 1 2) 10 20)"), Expression::Integer(20));
    assert_eq!(value("(if (quote ()) 1 2)"), Expression::Integer(2));
    assert_eq!(value("(if #f 1 2)"), Expression::Integer(2));
    assert_eq!(value("(if 0 1 2)"), Expression::Integer(1));
    assert_eq!(value("(not (quote ()))"), Expression::Boolean(true));
    assert_eq!(value("(not 0)"), Expression::Boolean(false));
}

#[test]
fn untaken_branch_has_no_effect() {
    let output = Output::default();
    let mut interpreter = Interpreter::with_output(Config::default(), Box::new(output.clone()));
    assert_eq!(
        run(&mut interpreter, "(if (> 2 1) 10 (print (quote alternative)))"),
        Expression::Integer(10)
    );
    assert_eq!(
        run(&mut interpreter, "(if (> 1 2) (print (quote consequent)) 20)"),
        Expression::Integer(20)
    );
    assert_eq!(output.text(), "");

    assert_eq!(
        run(&mut interpreter, "(if (> 2 1) 10 (define alt-ran 1))"),
        Expression::Integer(10)
    );
    assert_eq!(
        interpreter.run("alt-ran"),
        Err(Error::Eval(EvalError::UnboundVariable("alt-ran".to_string())))
    );
}

#[test]
fn print_writes_to_the_interpreter_output() {
    let output = Output::default();
    let mut interpreter = Interpreter::with_output(Config::default(), Box::new(output.clone()));
    assert_eq!(interpreter.run("(print 1 2.5 (quote (a #t)))"), Ok(None));
    assert_eq!(interpreter.run("(print)"), Ok(None));
    run(&mut interpreter, "(define show (lambda (x) (print (quote x=) x)))");
    assert_eq!(interpreter.run("(begin (show 1) (show 2))"), Ok(None));
    assert_eq!(output.text(), "1 2.5 (a #t)\n\nx= 1\nx= 2\n");
}

#[test]
fn print_reports_write_failures() {
    let mut interpreter = Interpreter::with_output(Config::default(), Box::new(Broken));
    assert!(matches!(
        interpreter.run("(print 1)"),
        Err(Error::Eval(EvalError::Output(_)))
    ));
}

#[test]
fn define_and_shadowing() {
    let mut interpreter = Interpreter::new();
    assert_eq!(interpreter.run("(define x 5)"), Ok(None));
    assert_eq!(run(&mut interpreter, "x"), Expression::Integer(5));
    assert_eq!(run(&mut interpreter, "((lambda (x) x) 7)"), Expression::Integer(7));
    assert_eq!(run(&mut interpreter, "x"), Expression::Integer(5));
}

#[test]
fn closures_capture_by_reference() {
    let mut interpreter = Interpreter::new();
    run(&mut interpreter, "(define f (lambda () x))");
    run(&mut interpreter, "(define x 9)");
    assert_eq!(run(&mut interpreter, "(f)"), Expression::Integer(9));
    run(&mut interpreter, "(define x 10)");
    assert_eq!(run(&mut interpreter, "(f)"), Expression::Integer(10));
}

#[test]
fn closures_keep_their_frame() {
    let mut interpreter = Interpreter::new();
    run(&mut interpreter, "(define make-adder (lambda (n) (lambda (x) (+ x n))))");
    run(&mut interpreter, "(define add3 (make-adder 3))");
    run(&mut interpreter, "(define add10 (make-adder 10))");
    assert_eq!(run(&mut interpreter, "(add3 4)"), Expression::Integer(7));
    assert_eq!(run(&mut interpreter, "(add10 4)"), Expression::Integer(14));
}

#[test]
fn define_falls_through_to_global() {
    let mut interpreter = Interpreter::new();
    run(&mut interpreter, "(define g (lambda (n) (define y n)))");
    assert_eq!(interpreter.run("(g 4)"), Ok(None));
    assert_eq!(run(&mut interpreter, "y"), Expression::Integer(4));

    // a parameter is the innermost owner, so it is overwritten in place
    run(&mut interpreter, "(define h (lambda (x) (begin (define x 100) x)))");
    assert_eq!(run(&mut interpreter, "(h 1)"), Expression::Integer(100));
    assert_eq!(
        interpreter.run("x"),
        Err(Error::Eval(EvalError::UnboundVariable("x".to_string())))
    );
}

#[test]
fn recursion() {
    let mut interpreter = Interpreter::new();
    run(
        &mut interpreter,
        "(define fact (lambda (n) (if (<= n 1) 1 (* n (fact (- n 1))))))",
    );
    assert_eq!(run(&mut interpreter, "(fact 10)"), Expression::Integer(3628800));
    assert_eq!(
        run(&mut interpreter, "(fact 20)"),
        Expression::Integer(2432902008176640000)
    );
    assert!(matches!(
        interpreter.run("(fact 21)"),
        Err(Error::Eval(EvalError::Arithmetic(_)))
    ));
}

#[test]
fn recursion_limit() {
    let mut interpreter = Interpreter::with_config(Config { max_depth: 50 });
    run(&mut interpreter, "(define spin (lambda (n) (spin n)))");
    assert_eq!(
        interpreter.run("(spin 0)"),
        Err(Error::Eval(EvalError::RecursionLimit(50)))
    );

    let nested = "(+ 1 ".repeat(60) + "0" + &")".repeat(60);
    assert_eq!(
        interpreter.run(&nested),
        Err(Error::Eval(EvalError::RecursionLimit(50)))
    );

    // the failed form does not poison later ones
    assert_eq!(run(&mut interpreter, "(+ 1 1)"), Expression::Integer(2));
}

#[test]
fn recursion_limit_with_default_config() {
    let mut interpreter = Interpreter::new();
    run(&mut interpreter, "(define spin (lambda (n) (spin n)))");
    assert_eq!(
        interpreter.run("(spin 0)"),
        Err(Error::Eval(EvalError::RecursionLimit(DEFAULT_MAX_DEPTH)))
    );

    let mut interpreter = Interpreter::with_config(Config { max_depth: 10_000 });
    run(&mut interpreter, "(define count (lambda (n) (if (= n 0) 0 (+ 1 (count (- n 1))))))");
    assert_eq!(run(&mut interpreter, "(count 2000)"), Expression::Integer(2000));
    assert_eq!(
        interpreter.run("(count 20000)"),
        Err(Error::Eval(EvalError::RecursionLimit(10_000)))
    );
}

#[test]
fn deeply_nested_input() {
    let depth = 200_000;
    let text = "(".repeat(depth) + &")".repeat(depth);
    assert_eq!(
        Interpreter::new().run(&text),
        Err(Error::Eval(EvalError::RecursionLimit(DEFAULT_MAX_DEPTH)))
    );

    let depth = 50_000;
    let text = "(".repeat(depth) + "x" + &")".repeat(depth);
    let quoted = value(&format!("(quote {})", text));
    assert_eq!(quoted.to_string(), text);
    assert_eq!(
        value(&format!("(equal? (quote {0}) (quote {0}))", text)),
        Expression::Boolean(true)
    );
}

#[test]
fn operands_evaluate_left_to_right() {
    assert_eq!(
        value("(list (begin (define k 1) k) k)"),
        parse("(1 1)").unwrap()
    );
}

#[test]
fn quote() {
    assert_eq!(value("(quote (a (b 1) 2.5))"), parse("(a (b 1) 2.5)").unwrap());
    assert_eq!(value("(quote if)"), Expression::symbol("if"));
    assert_eq!(value("()"), Expression::nil());
}

#[test]
fn lists() {
    assert_eq!(value("(car (list 1 2 3))"), Expression::Integer(1));
    assert_eq!(value("(cdr (list 1 2 3))"), parse("(2 3)").unwrap());
    assert_eq!(value("(cdr (quote ()))"), Expression::nil());
    assert_eq!(value("(cons 1 (quote (2 3)))"), parse("(1 2 3)").unwrap());
    assert_eq!(
        value("(append (list 1) (list 2 3) (quote ()))"),
        parse("(1 2 3)").unwrap()
    );
    assert_eq!(value("(length (list 1 2 3))"), Expression::Integer(3));
    assert_eq!(value("(null? (quote ()))"), Expression::Boolean(true));
    assert_eq!(value("(null? (list 0))"), Expression::Boolean(false));
    assert_eq!(value("(list? (list))"), Expression::Boolean(true));
    assert!(matches!(
        eval_error("(car (quote ()))"),
        EvalError::PrimitiveType { .. }
    ));
    assert!(matches!(eval_error("(cons 1 2)"), EvalError::PrimitiveType { .. }));
}

#[test]
fn higher_order() {
    assert_eq!(
        value("(map (lambda (x) (* x x)) (list 1 2 3))"),
        parse("(1 4 9)").unwrap()
    );
    assert_eq!(
        value("(map + (list 1 2) (list 10 20 30))"),
        parse("(11 22)").unwrap()
    );
    assert_eq!(value("(apply + (list 1 2))"), Expression::Integer(3));
    assert_eq!(value("(begin 1 2 3)"), Expression::Integer(3));
}

#[test]
fn predicates() {
    assert_eq!(value("(number? 1.5)"), Expression::Boolean(true));
    assert_eq!(value("(number? (quote a))"), Expression::Boolean(false));
    assert_eq!(value("(symbol? (quote a))"), Expression::Boolean(true));
    assert_eq!(value("(procedure? car)"), Expression::Boolean(true));
    assert_eq!(value("(procedure? (lambda () 1))"), Expression::Boolean(true));
    assert_eq!(value("(boolean? #f)"), Expression::Boolean(true));
    assert_eq!(value("(eq? (quote a) (quote a))"), Expression::Boolean(true));
    assert_eq!(value("(eq? (list 1) (list 1))"), Expression::Boolean(false));
    assert_eq!(value("(equal? (list 1 2.0) (list 1.0 2))"), Expression::Boolean(true));
}

#[test]
fn math_module() {
    assert_eq!(value("(log10 1000)"), Expression::Float(3.0));
    assert_eq!(value("(log2 8)"), Expression::Float(3.0));
    assert_eq!(value("(atan2 0 1)"), Expression::Float(0.0));
    assert_eq!(value("(hypot 3 4)"), Expression::Float(5.0));
    assert_eq!(value("(degrees 0)"), Expression::Float(0.0));
    assert_eq!(value("(< (fabs (- (degrees pi) 180)) 1e-9)"), Expression::Boolean(true));
    assert_eq!(value("(< (fabs (- (radians 180) pi)) 1e-12)"), Expression::Boolean(true));
    assert_eq!(value("(fmod 7 3)"), Expression::Float(1.0));
    assert_eq!(value("(fmod -7 3)"), Expression::Float(-1.0));
    assert_eq!(value("(factorial 0)"), Expression::Integer(1));
    assert_eq!(value("(factorial 20)"), Expression::Integer(2432902008176640000));
    assert_eq!(value("(gcd 12 -18)"), Expression::Integer(6));
    assert_eq!(value("(gcd 0 5 10)"), Expression::Integer(5));
    assert_eq!(value("(gcd)"), Expression::Integer(0));

    assert!(matches!(eval_error("(fmod 1 0)"), EvalError::Arithmetic(_)));
    assert!(matches!(eval_error("(log10 -1)"), EvalError::Arithmetic(_)));
    assert!(matches!(eval_error("(factorial -1)"), EvalError::Arithmetic(_)));
    assert!(matches!(eval_error("(factorial 21)"), EvalError::Arithmetic(_)));
    assert!(matches!(eval_error("(factorial 2.0)"), EvalError::PrimitiveType { .. }));
    assert!(matches!(eval_error("(gcd 1.5 2)"), EvalError::PrimitiveType { .. }));
}

#[test]
fn unbound_variable() {
    assert_eq!(
        eval_error("(does-not-exist)"),
        EvalError::UnboundVariable("does-not-exist".to_string())
    );
}

#[test]
fn arity_mismatch() {
    assert!(matches!(
        eval_error("((lambda (a b) a) 1)"),
        EvalError::Arity {
            expected: Arity::Exact(2),
            found: 1,
            ..
        }
    ));
    assert!(matches!(
        eval_error("(car 1 2)"),
        EvalError::Arity {
            expected: Arity::Exact(1),
            found: 2,
            ..
        }
    ));
}

#[test]
fn not_a_procedure() {
    assert_eq!(eval_error("(1 2)"), EvalError::NotAProcedure("1".to_string()));
}

#[test]
fn malformed_special_forms() {
    for source in &[
        "(quote)",
        "(quote a b)",
        "(if 1 2)",
        "(define x)",
        "(define 1 2)",
        "(lambda x x)",
        "(lambda (x 1) x)",
        "(lambda (x x) x)",
        "(lambda (x) x x)",
    ] {
        assert!(
            matches!(eval_error(source), EvalError::Syntax(_)),
            "{} should be a syntax error",
            source
        );
    }
}

#[test]
fn special_forms_cannot_be_rebound() {
    assert!(matches!(eval_error("(define if 1)"), EvalError::Syntax(_)));
    assert!(matches!(eval_error("(lambda (quote) 1)"), EvalError::Syntax(_)));
}

#[test]
fn read_errors() {
    let mut interpreter = Interpreter::new();
    match interpreter.run(")") {
        Err(Error::Read(err)) => {
            assert_eq!(err.data, ReadError::UnexpectedClose);
            assert_eq!(err.to_string(), "unexpected `)` at line 1, column 1");
        },
        other => panic!("expected a read error, got {:?}", other),
    }
    match interpreter.run("(") {
        Err(Error::Read(err)) => assert_eq!(err.data, ReadError::UnexpectedEnd),
        other => panic!("expected a read error, got {:?}", other),
    }
}

#[test]
fn failed_form_keeps_earlier_bindings() {
    let mut interpreter = Interpreter::new();
    assert!(interpreter.run("(define a 1) (car a) (define b 2)").is_err());
    assert_eq!(run(&mut interpreter, "a"), Expression::Integer(1));
    assert!(interpreter.run("b").is_err());
}

#[test]
fn printing() {
    assert_eq!(value("(quote (1 2.0 #t (x)))").to_string(), "(1 2.0 #t (x))");
    assert_eq!(value("(lambda (a b) a)").to_string(), "#<procedure (a b)>");
    assert_eq!(value("car").to_string(), "#<builtin car>");
}

#[test]
fn eval_parsed_expression() {
    let mut interpreter = Interpreter::new();
    let exp = parse("(+ 1 2)").unwrap();
    assert_eq!(interpreter.eval(&exp), Ok(Some(Expression::Integer(3))));
    assert_eq!(interpreter.eval(&parse("(print 1)").unwrap()), Ok(None));
}

// //////////////////////////////////////////////////////////
// Utility functions
// //////////////////////////////////////////////////////////

fn run(interpreter: &mut Interpreter, source: &str) -> Expression {
    interpreter
        .run(source)
        .unwrap()
        .unwrap_or(Expression::Unspecified)
}

fn value(source: &str) -> Expression {
    run(&mut Interpreter::new(), source)
}

#[derive(Clone, Default)]
struct Output(Rc<RefCell<Vec<u8>>>);

impl Output {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Broken;

impl Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn eval_error(source: &str) -> EvalError {
    match Interpreter::new().run(source) {
        Err(Error::Eval(err)) => err,
        other => panic!("expected an evaluation error for {}, got {:?}", source, other),
    }
}
