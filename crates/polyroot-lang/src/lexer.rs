//! Custom lexer for the polynomial grammar. Knows the declared variable name so that any
//! other identifier is rejected here, with its position, instead of as a grammar error.

use crate::error::EngineError;
use ordered_float::OrderedFloat;
use std::fmt;
use std::str::FromStr;

pub type Spanned<Tok, Loc, Error> = Result<(Loc, Tok, Loc), Error>;

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Num(OrderedFloat<f64>),
    /// The declared free variable.
    Var,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(n) => write!(f, "number {n}"),
            Tok::Var => write!(f, "variable"),
            Tok::LParen => write!(f, "'('"),
            Tok::RParen => write!(f, "')'"),
            Tok::Plus => write!(f, "'+'"),
            Tok::Minus => write!(f, "'-'"),
            Tok::Star => write!(f, "'*'"),
            Tok::Slash => write!(f, "'/'"),
            Tok::Caret => write!(f, "'^'"),
        }
    }
}

pub struct Lexer<'input> {
    input: &'input str,
    variable: &'input str,
    pos: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str, variable: &'input str) -> Self {
        Lexer {
            input,
            variable,
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let skipped = rest
            .bytes()
            .take_while(|b| b" \t\n\r".contains(b))
            .count();
        self.pos += skipped;
    }

    fn take_ident(&mut self) -> &'input str {
        let rest = &self.input[self.pos..];
        let end = rest
            .char_indices()
            .find(|&(i, c)| !(c.is_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit())))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Digits and dots are taken greedily so "1.2.3" is one bad literal rather than two numbers.
    fn take_num(&mut self) -> Result<OrderedFloat<f64>, EngineError> {
        let start = self.pos;
        let rest = &self.input[self.pos..];
        let bytes = rest.as_bytes();
        let n = bytes.len();
        let mut end = 0;
        while end < n && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
            end += 1;
        }
        // Optional exponent, only when digits follow ("2e3", "1.5E-2")
        if end < n && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < n && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            if exp_end < n && bytes[exp_end].is_ascii_digit() {
                while exp_end < n && bytes[exp_end].is_ascii_digit() {
                    exp_end += 1;
                }
                end = exp_end;
            }
        }
        let literal = &rest[..end];
        self.pos += end;
        match f64::from_str(literal) {
            Ok(v) if v.is_finite() => Ok(OrderedFloat::from(v)),
            _ => Err(EngineError::syntax(
                start,
                format!("invalid numeric literal '{literal}'"),
            )),
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Spanned<Tok, usize, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.pos;
        let c = self.input[self.pos..].chars().next()?;

        let tok = match c {
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '^' => Tok::Caret,
            '0'..='9' | '.' => {
                return Some(self.take_num().map(|n| (start, Tok::Num(n), self.pos)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.take_ident();
                if ident == self.variable {
                    return Some(Ok((start, Tok::Var, self.pos)));
                }
                return Some(Err(EngineError::syntax(
                    start,
                    format!("unknown identifier '{ident}' (expected '{}')", self.variable),
                )));
            }
            other => {
                return Some(Err(EngineError::syntax(
                    start,
                    format!("unexpected character '{other}'"),
                )));
            }
        };
        self.pos += c.len_utf8();
        Some(Ok((start, tok, self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Tok> {
        Lexer::new(input, "x")
            .map(|t| t.map(|(_, tok, _)| tok))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn num(v: f64) -> Tok {
        Tok::Num(OrderedFloat::from(v))
    }

    #[test]
    fn splits_implicit_product() {
        assert_eq!(tokens("3x"), vec![num(3.0), Tok::Var]);
        assert_eq!(
            tokens("2(x+1)"),
            vec![num(2.0), Tok::LParen, Tok::Var, Tok::Plus, num(1.0), Tok::RParen]
        );
    }

    #[test]
    fn scientific_literals() {
        assert_eq!(tokens("2e3"), vec![num(2000.0)]);
        assert_eq!(tokens("1.5E-2"), vec![num(0.015)]);
        assert_eq!(tokens(".5"), vec![num(0.5)]);
    }

    #[test]
    fn spans_are_byte_offsets() {
        let spans: Vec<_> = Lexer::new("x ^ 12", "x").map(|t| t.unwrap()).collect();
        assert_eq!(spans[0], (0, Tok::Var, 1));
        assert_eq!(spans[1], (2, Tok::Caret, 3));
        assert_eq!(spans[2], (4, num(12.0), 6));
    }

    #[test]
    fn invalid_literal_reports_start() {
        let err = Lexer::new("x + 1.2.3", "x")
            .find_map(|t| t.err())
            .unwrap();
        assert_eq!(err, EngineError::syntax(4, "invalid numeric literal '1.2.3'"));
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let err = Lexer::new("2y", "x").find_map(|t| t.err()).unwrap();
        match err {
            EngineError::Syntax(e) => {
                assert_eq!(e.position, 1);
                assert!(e.reason.contains("'y'"));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn custom_variable_name() {
        let toks: Vec<_> = Lexer::new("t^2", "t").map(|t| t.unwrap().1).collect();
        assert_eq!(toks, vec![Tok::Var, Tok::Caret, num(2.0)]);
    }
}
