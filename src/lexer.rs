use std::iter::Iterator;
use peekmore::{PeekMore, PeekMoreIterator};

use super::{Token, Located, Location, ToLocated};

/// Splits source text into parentheses and atoms. Never fails.
pub struct Lexer<CharIter: Iterator<Item = char>> {
    char_stream: PeekMoreIterator<CharIter>,
    location: Location,
}

impl<CharIter: Iterator<Item = char>> Iterator for Lexer<CharIter> {
    type Item = Located<Token>;
    fn next(&mut self) -> Option<Self::Item> {
        self.get_next_token()
    }
}

impl<CharIter: Iterator<Item = char>> Lexer<CharIter> {
    pub fn new(char_stream: CharIter) -> Self {
        Self {
            char_stream: char_stream.peekmore(),
            location: Location::start(),
        }
    }

    fn get_next_token(&mut self) -> Option<Located<Token>> {
        while let Some(ch) = self.peek() {
            let location = self.location;
            return Some(match ch {
                _ if ch.is_whitespace() => {self.advance(); continue},
                '(' => {self.advance(); Token::LeftParen},
                ')' => {self.advance(); Token::RightParen},
                _ => self.get_atom(),
            }.with_locate(location))
        }

        None
    }

    fn get_atom(&mut self) -> Token {
        let mut atom = String::new();
        while let Some(ch) = self.peek() {
            if is_delimiter(ch) {
                break;
            }
            atom.push(ch);
            self.advance();
        }
        debug_assert!(!atom.is_empty());
        Token::Atom(atom)
    }

    fn peek(&mut self) -> Option<char> {
        self.char_stream.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.char_stream.next();
        if let Some(ch) = ch {
            self.location.step(ch);
        }
        ch
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

/// Token texts of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    Lexer::new(text.chars())
        .map(|l| l.extract().as_str().to_string())
        .collect()
}

#[test]
fn simple_application() {
    assert_eq!(tokenize("(+ 1 2)"), vec!["(", "+", "1", "2", ")"]);
}

#[test]
// Whitespace only separates tokens; parens always stand alone.
fn whitespace() {
    assert_eq!(tokenize(""), Vec::<String>::new());
    assert_eq!(tokenize(" \t\r\n "), Vec::<String>::new());
    assert_eq!(
        tokenize("((a)b\t( c\n))"),
        vec!["(", "(", "a", ")", "b", "(", "c", ")", ")"]
    );
}

#[test]
// No strings, comments, or quote shorthand: those characters are atom content.
fn no_special_characters() {
    assert_eq!(
        tokenize("(print \"hi; there\" 'x)"),
        vec!["(", "print", "\"hi;", "there\"", "'x", ")"]
    );
}

#[test]
fn unbalanced_input_still_tokenizes() {
    assert_eq!(tokenize(")"), vec![")"]);
    assert_eq!(tokenize("(("), vec!["(", "("]);
}

#[test]
fn locations() {
    let tokens = Lexer::new("(define x\n  42)".chars()).collect::<Vec<_>>();
    let located = tokens
        .iter()
        .map(|t| (t.as_str().to_string(), t.location.map(|l| (l.row, l.col))))
        .collect::<Vec<_>>();

    assert_eq!(
        located,
        vec![
            ("(".to_string(), Some((0, 0))),
            ("define".to_string(), Some((0, 1))),
            ("x".to_string(), Some((0, 8))),
            ("42".to_string(), Some((1, 2))),
            (")".to_string(), Some((1, 4))),
        ]
    );
}

#[test]
fn script() {
    assert_eq!(
        tokenize(
            "(define fact
                (lambda (n)
                    (if (<= n 1) 1 (* n (fact (- n 1))))))"
        ),
        vec![
            "(", "define", "fact",
            "(", "lambda", "(", "n", ")",
            "(", "if", "(", "<=", "n", "1", ")", "1",
            "(", "*", "n", "(", "fact", "(", "-", "n", "1", ")", ")", ")",
            ")", ")", ")",
        ]
    );
}
