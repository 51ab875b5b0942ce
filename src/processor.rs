use super::{Expression, Located, Location, ReadError, ToLocated, Token};

type Result<T> = std::result::Result<T, Located<ReadError>>;

/// The reader: turns a token stream into expressions, one top-level form at a
/// time. Unread tokens stay in the stream for the next call.
pub struct Processor<TokenIter: Iterator<Item = Located<Token>>> {
    tokens: TokenIter,
}

impl<TokenIter: Iterator<Item = Located<Token>>> Iterator for Processor<TokenIter> {
    type Item = Result<Expression>;
    fn next(&mut self) -> Option<Self::Item> {
        self.get_next_expression().transpose()
    }
}

impl<TokenIter: Iterator<Item = Located<Token>>> Processor<TokenIter> {
    pub fn from(tokens: TokenIter) -> Processor<TokenIter> {
        Self { tokens }
    }

    /// Reads one form; an exhausted stream is an error here.
    pub fn read_expression(&mut self) -> Result<Expression> {
        self.get_next_expression()?
            .ok_or_else(|| ReadError::UnexpectedEnd.without_locate())
    }

    /// Reads one form, or `None` if the stream ended cleanly between forms.
    ///
    /// Open lists live on an explicit stack, so nesting depth does not grow
    /// the call stack.
    pub fn get_next_expression(&mut self) -> Result<Option<Expression>> {
        let mut open: Vec<(Vec<Expression>, Option<Location>)> = vec![];

        loop {
            let Located { data: token, location } = match self.tokens.next() {
                Some(token) => token,
                None => {
                    return match open.pop() {
                        None => Ok(None),
                        Some((_, location)) => Err(Located {
                            data: ReadError::UnexpectedEnd,
                            location,
                        }),
                    }
                },
            };

            let expression = match token {
                Token::LeftParen => {
                    open.push((vec![], location));
                    continue;
                },
                Token::RightParen => match open.pop() {
                    Some((items, _)) => Expression::List(items),
                    None => {
                        return match location {
                            Some(location) => located_error!(ReadError::UnexpectedClose, location),
                            None => Err(ReadError::UnexpectedClose.without_locate()),
                        }
                    },
                },
                Token::Atom(text) => Expression::atom(&text),
            };

            match open.last_mut() {
                Some((items, _)) => items.push(expression),
                None => return Ok(Some(expression)),
            }
        }
    }
}

#[cfg(test)]
fn read_all(text: &str) -> Result<Vec<Expression>> {
    Processor::from(crate::Lexer::new(text.chars())).collect()
}

#[test]
fn nested_lists() -> Result<()> {
    assert_eq!(
        read_all("(+ 1 (* 2.5 x) ())")?,
        vec![Expression::List(vec![
            Expression::symbol("+"),
            Expression::Integer(1),
            Expression::List(vec![
                Expression::symbol("*"),
                Expression::Float(2.5),
                Expression::symbol("x"),
            ]),
            Expression::nil(),
        ])]
    );
    Ok(())
}

#[test]
fn several_top_level_forms() -> Result<()> {
    let mut processor = Processor::from(crate::Lexer::new("(define x 1) x 42".chars()));
    assert_eq!(
        processor.read_expression()?,
        Expression::List(vec![
            Expression::symbol("define"),
            Expression::symbol("x"),
            Expression::Integer(1),
        ])
    );
    assert_eq!(processor.read_expression()?, Expression::symbol("x"));
    assert_eq!(processor.get_next_expression()?, Some(Expression::Integer(42)));
    assert_eq!(processor.get_next_expression()?, None);
    assert_eq!(
        processor.read_expression(),
        Err(ReadError::UnexpectedEnd.without_locate())
    );
    Ok(())
}

#[test]
fn unexpected_close() {
    let err = read_all("(a b))").unwrap_err();
    assert_eq!(err.data, ReadError::UnexpectedClose);
    assert_eq!(err.location, Some(Location { row: 0, col: 5 }));
}

#[test]
fn unexpected_end_points_at_open_paren() {
    let err = read_all("(a\n  (b c)\n  (d").unwrap_err();
    assert_eq!(err.data, ReadError::UnexpectedEnd);
    assert_eq!(err.location, Some(Location { row: 2, col: 2 }));
}

#[test]
fn deep_nesting_does_not_recurse() -> Result<()> {
    let depth = 200_000;
    let text = "(".repeat(depth) + &")".repeat(depth);
    let expression = Processor::from(crate::Lexer::new(text.chars())).read_expression()?;

    let mut seen = 0;
    let mut current = &expression;
    loop {
        match current {
            Expression::List(items) => {
                seen += 1;
                match items.first() {
                    Some(first) => current = first,
                    None => break,
                }
            },
            other => panic!("unexpected {}", other),
        }
    }
    assert_eq!(seen, depth);

    assert_eq!(expression.clone(), expression);
    assert_eq!(expression.to_string(), text);
    Ok(())
}
