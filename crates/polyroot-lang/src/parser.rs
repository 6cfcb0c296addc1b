//! Parser: expression string → [Expr].
//! Uses a LALRPOP-generated grammar over the custom lexer in [crate::lexer].

use crate::error::EngineError;
use crate::ir::Expr;
use crate::lexer::{self, Tok};
use lalrpop_util::{lalrpop_mod, ParseError};

lalrpop_mod!(
    #[allow(clippy::ptr_arg)]
    #[allow(clippy::empty_line_after_outer_attr)]
    #[allow(clippy::uninlined_format_args)]
    #[allow(clippy::type_complexity)]
    #[allow(dead_code)]
    #[allow(unused_imports)]
    expr
);

/// Name of the free variable when none is configured.
pub const DEFAULT_VARIABLE: &str = "x";

/// Parse a polynomial expression in `x`.
pub fn parse(input: &str) -> Result<Expr, EngineError> {
    parse_with_variable(input, DEFAULT_VARIABLE)
}

/// Parse a polynomial expression whose only free variable is `variable`.
pub fn parse_with_variable(input: &str, variable: &str) -> Result<Expr, EngineError> {
    if input.trim().is_empty() {
        return Err(EngineError::syntax(0, "empty expression"));
    }
    check_parentheses(input)?;
    let lexer = lexer::Lexer::new(input, variable);
    expr::ExprParser::new()
        .parse(lexer)
        .map_err(grammar_error)
}

/// Report the first unmatched parenthesis before the grammar sees the input,
/// so the error names the paren instead of whatever token came next.
fn check_parentheses(input: &str) -> Result<(), EngineError> {
    let mut open = Vec::new();
    for (i, c) in input.char_indices() {
        match c {
            '(' => open.push(i),
            ')' => {
                if open.pop().is_none() {
                    return Err(EngineError::syntax(i, "unmatched ')'"));
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(i) => Err(EngineError::syntax(i, "unmatched '('")),
        None => Ok(()),
    }
}

fn grammar_error(e: ParseError<usize, Tok, EngineError>) -> EngineError {
    match e {
        ParseError::InvalidToken { location } => EngineError::syntax(location, "invalid token"),
        ParseError::UnrecognizedEof { location, .. } => {
            EngineError::syntax(location, "unexpected end of expression")
        }
        ParseError::UnrecognizedToken {
            token: (start, tok, _),
            ..
        }
        | ParseError::ExtraToken {
            token: (start, tok, _),
        } => EngineError::syntax(start, format!("unexpected {tok}")),
        ParseError::User { error } => error,
    }
}

/// Build `base^exponent`, folding the exponent to a non-negative integer.
/// Called from the grammar when a `^` is reduced; `at` is the position of the caret.
pub(crate) fn exponentiate(base: Expr, exponent: Expr, at: usize) -> Result<Expr, EngineError> {
    if exponent.mentions_variable() {
        return Err(EngineError::NotPolynomial(format!(
            "exponent at position {at} depends on the variable"
        )));
    }
    let value = exponent.constant_value().unwrap_or(f64::NAN);
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(EngineError::Domain(format!(
            "exponent at position {at} must be an integer, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(EngineError::Domain(format!(
            "exponent at position {at} must be non-negative, got {value}"
        )));
    }
    if value > f64::from(u32::MAX) {
        return Err(EngineError::Domain(format!(
            "exponent at position {at} is too large"
        )));
    }
    Ok(Expr::Pow(Box::new(base), value as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn c(v: f64) -> Box<Expr> {
        Box::new(Expr::constant(v))
    }

    fn var() -> Box<Expr> {
        Box::new(Expr::Var)
    }

    fn syntax_position(input: &str) -> usize {
        match parse(input).unwrap_err() {
            EngineError::Syntax(e) => e.position,
            other => panic!("expected syntax error for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn parse_lit_and_var() {
        assert_eq!(parse("42").unwrap(), Expr::constant(42.0));
        assert_eq!(parse("1.5").unwrap(), Expr::constant(1.5));
        assert_eq!(parse("x").unwrap(), Expr::Var);
    }

    #[test]
    fn parse_precedence_mul_tighter_than_add() {
        assert_eq!(
            parse("1 + 2 * x").unwrap(),
            Expr::Add(c(1.0), Box::new(Expr::Mul(c(2.0), var())))
        );
    }

    #[test]
    fn parse_sub_and_div_left_associative() {
        assert_eq!(
            parse("x - 1 - 2").unwrap(),
            Expr::Sub(Box::new(Expr::Sub(var(), c(1.0))), c(2.0))
        );
        assert_eq!(
            parse("x / 2 / 4").unwrap(),
            Expr::Div(Box::new(Expr::Div(var(), c(2.0))), c(4.0))
        );
    }

    #[test]
    fn parse_implicit_mul() {
        assert_eq!(parse("3x").unwrap(), Expr::Mul(c(3.0), var()));
        assert_eq!(
            parse("2x^2").unwrap(),
            Expr::Mul(c(2.0), Box::new(Expr::Pow(var(), 2)))
        );
        assert_eq!(
            parse("(x-1)(x-2)").unwrap(),
            Expr::Mul(
                Box::new(Expr::Sub(var(), c(1.0))),
                Box::new(Expr::Sub(var(), c(2.0)))
            )
        );
    }

    #[test]
    fn parse_space_before_minus_is_subtraction() {
        assert_eq!(parse("2 -x").unwrap(), Expr::Sub(c(2.0), var()));
    }

    #[test]
    fn parse_unary_minus_applies_to_power() {
        assert_eq!(
            parse("-x^2").unwrap(),
            Expr::Neg(Box::new(Expr::Pow(var(), 2)))
        );
        assert_eq!(
            parse("2 * -x").unwrap(),
            Expr::Mul(c(2.0), Box::new(Expr::Neg(var())))
        );
        assert_eq!(parse("+x").unwrap(), Expr::Var);
    }

    #[test]
    fn parse_exponent_folds_constant_subexpression() {
        assert_eq!(parse("x^(1+1)").unwrap(), Expr::Pow(var(), 2));
        // right-associative: x^(2^2)
        assert_eq!(parse("x^2^2").unwrap(), Expr::Pow(var(), 4));
        assert_eq!(parse("x^0").unwrap(), Expr::Pow(var(), 0));
    }

    #[test]
    fn parse_negative_or_fractional_exponent_is_domain_error() {
        assert_eq!(parse("x^-1").unwrap_err().kind(), ErrorKind::Domain);
        assert_eq!(parse("x^0.5").unwrap_err().kind(), ErrorKind::Domain);
        assert_eq!(parse("x^(1/2)").unwrap_err().kind(), ErrorKind::Domain);
    }

    #[test]
    fn parse_variable_in_exponent_is_not_polynomial() {
        assert_eq!(parse("2^x").unwrap_err().kind(), ErrorKind::NotPolynomial);
        assert_eq!(parse("x^x").unwrap_err().kind(), ErrorKind::NotPolynomial);
    }

    #[test]
    fn parse_empty_is_error() {
        assert_eq!(syntax_position(""), 0);
        assert_eq!(syntax_position("   "), 0);
    }

    #[test]
    fn parse_unmatched_parens_report_position() {
        assert_eq!(syntax_position("(x + 1"), 0);
        assert_eq!(syntax_position("x + 1)"), 5);
        assert_eq!(syntax_position("((x)"), 0);
    }

    #[test]
    fn parse_unknown_identifier_is_error() {
        assert_eq!(syntax_position("x + y"), 4);
        assert_eq!(syntax_position("sin(x)"), 0);
    }

    #[test]
    fn parse_invalid_literal_is_error() {
        assert_eq!(syntax_position("1.2.3x"), 0);
        assert_eq!(syntax_position("x + ."), 4);
    }

    #[test]
    fn parse_dangling_operator_is_error() {
        assert!(matches!(parse("x +"), Err(EngineError::Syntax(_))));
        assert_eq!(syntax_position("x * * 2"), 4);
        assert_eq!(syntax_position("()"), 1);
    }

    #[test]
    fn parse_with_custom_variable() {
        assert_eq!(
            parse_with_variable("3t + 1", "t").unwrap(),
            Expr::Add(Box::new(Expr::Mul(c(3.0), var())), c(1.0))
        );
        assert!(parse_with_variable("3x", "t").is_err());
    }
}
