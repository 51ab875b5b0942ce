use super::{Expression, Lexer, Located, Processor, ReadError};

type Result<T> = std::result::Result<T, Located<ReadError>>;

/// Reads the first form of `program`; anything after it is ignored.
pub fn parse(program: &str) -> Result<Expression> {
    Processor::from(Lexer::new(program.chars())).read_expression()
}

/// Reads every top-level form of `program`.
pub fn parse_all(program: &str) -> Result<Vec<Expression>> {
    Processor::from(Lexer::new(program.chars())).collect()
}

#[test]
fn application() -> Result<()> {
    assert_eq!(
        parse("(+ 1 2)")?,
        Expression::List(vec![
            Expression::symbol("+"),
            Expression::Integer(1),
            Expression::Integer(2),
        ])
    );
    Ok(())
}

#[test]
fn malformed() {
    assert_eq!(parse(")").unwrap_err().data, ReadError::UnexpectedClose);
    assert_eq!(parse("(").unwrap_err().data, ReadError::UnexpectedEnd);
    assert_eq!(parse("").unwrap_err().data, ReadError::UnexpectedEnd);
    assert_eq!(parse_all("(a) (b").unwrap_err().data, ReadError::UnexpectedEnd);
}

#[test]
fn trailing_forms() -> Result<()> {
    assert_eq!(parse("1 2 3")?, Expression::Integer(1));
    assert_eq!(
        parse_all("1 2.0 x")?,
        vec![
            Expression::Integer(1),
            Expression::Float(2.0),
            Expression::symbol("x"),
        ]
    );
    assert_eq!(parse_all("   ")?, vec![]);
    Ok(())
}

#[test]
fn round_trip() -> Result<()> {
    let trees = vec![
        Expression::Integer(-42),
        Expression::Float(0.1),
        Expression::Float(1e300),
        Expression::Float(-3.0),
        Expression::Float(f64::INFINITY),
        Expression::Boolean(false),
        Expression::symbol("list->vector"),
        Expression::nil(),
        Expression::List(vec![
            Expression::symbol("define"),
            Expression::symbol("f"),
            Expression::List(vec![
                Expression::symbol("lambda"),
                Expression::List(vec![Expression::symbol("x")]),
                Expression::List(vec![
                    Expression::symbol("*"),
                    Expression::symbol("x"),
                    Expression::Float(2.5),
                    Expression::List(vec![Expression::nil(), Expression::Boolean(true)]),
                ]),
            ]),
        ]),
    ];

    for tree in trees {
        assert_eq!(parse(&tree.to_string())?, tree);
    }
    Ok(())
}
