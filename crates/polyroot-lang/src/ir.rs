//! IR: the parsed expression tree and the Salsa input that holds an equation's source text.

use ordered_float::OrderedFloat;

/// Expression over a single free variable. Built by the parser, never mutated afterwards.
/// Exponents are already resolved to non-negative integers when the tree is built.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Expr {
    Const(OrderedFloat<f64>),
    /// The declared free variable (name is held by the parser config, not the node).
    Var,
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, u32),
    /// Unary minus (e.g. "-x", "-(x + 1)").
    Neg(Box<Expr>),
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr::Const(OrderedFloat::from(value))
    }

    pub fn mentions_variable(&self) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Var => true,
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) => {
                l.mentions_variable() || r.mentions_variable()
            }
            Expr::Pow(base, _) => base.mentions_variable(),
            Expr::Neg(inner) => inner.mentions_variable(),
        }
    }

    /// Value of a variable-free subtree; None if the variable occurs anywhere in it.
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(c.into_inner()),
            Expr::Var => None,
            Expr::Add(l, r) => Some(l.constant_value()? + r.constant_value()?),
            Expr::Sub(l, r) => Some(l.constant_value()? - r.constant_value()?),
            Expr::Mul(l, r) => Some(l.constant_value()? * r.constant_value()?),
            Expr::Div(l, r) => Some(l.constant_value()? / r.constant_value()?),
            Expr::Pow(base, n) => Some(powu(base.constant_value()?, *n)),
            Expr::Neg(inner) => Some(-inner.constant_value()?),
        }
    }
}

/// `base^n` for any u32 exponent (powi takes i32).
pub(crate) fn powu(base: f64, n: u32) -> f64 {
    match i32::try_from(n) {
        Ok(n) => base.powi(n),
        Err(_) => base.powf(f64::from(n)),
    }
}

/// Input holding one equation as typed, plus the parse/normalize settings it is read under.
/// Queries in [crate::queries] are memoized per input.
#[salsa::input]
pub struct EquationDef {
    #[returns(ref)]
    pub text: String,
    #[returns(ref)]
    pub variable: String,
    pub max_degree: u32,
}
