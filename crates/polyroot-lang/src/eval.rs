//! Evaluator: compile an [Expr] into a constant-folded tree and sample it for plotting.

use crate::ir::{powu, Expr};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Fixed plotting domain: the 201 integers -100..=100.
pub const SAMPLE_DOMAIN: RangeInclusive<i64> = -100..=100;

/// Expression tree with every variable-free subtree already folded to a constant.
#[derive(Clone, PartialEq, Debug)]
pub enum Compiled {
    Const(f64),
    Var,
    Add(Box<Compiled>, Box<Compiled>),
    Sub(Box<Compiled>, Box<Compiled>),
    Mul(Box<Compiled>, Box<Compiled>),
    Div(Box<Compiled>, Box<Compiled>),
    Pow(Box<Compiled>, u32),
    Neg(Box<Compiled>),
}

/// Compile an expression for repeated evaluation.
pub fn compile(expr: &Expr) -> Compiled {
    if let Some(c) = expr.constant_value() {
        return Compiled::Const(c);
    }
    let bin = |l: &Expr, r: &Expr| (Box::new(compile(l)), Box::new(compile(r)));
    match expr {
        Expr::Const(c) => Compiled::Const(c.into_inner()),
        Expr::Var => Compiled::Var,
        Expr::Add(l, r) => {
            let (l, r) = bin(l, r);
            Compiled::Add(l, r)
        }
        Expr::Sub(l, r) => {
            let (l, r) = bin(l, r);
            Compiled::Sub(l, r)
        }
        Expr::Mul(l, r) => {
            let (l, r) = bin(l, r);
            Compiled::Mul(l, r)
        }
        Expr::Div(l, r) => {
            let (l, r) = bin(l, r);
            Compiled::Div(l, r)
        }
        Expr::Pow(base, n) => Compiled::Pow(Box::new(compile(base)), *n),
        Expr::Neg(inner) => Compiled::Neg(Box::new(compile(inner))),
    }
}

impl Compiled {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Compiled::Const(c) => *c,
            Compiled::Var => x,
            Compiled::Add(l, r) => l.eval(x) + r.eval(x),
            Compiled::Sub(l, r) => l.eval(x) - r.eval(x),
            Compiled::Mul(l, r) => l.eval(x) * r.eval(x),
            Compiled::Div(l, r) => l.eval(x) / r.eval(x),
            Compiled::Pow(base, n) => powu(base.eval(x), *n),
            Compiled::Neg(inner) => -inner.eval(x),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Compiled::Const(_))
    }
}

/// `(x, y)` pairs over [SAMPLE_DOMAIN], in ascending x. Used for plotting only.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct SampleSet {
    points: Vec<(i64, f64)>,
}

impl SampleSet {
    pub fn points(&self) -> &[(i64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shape consumed by the charting collaborator.
    pub fn to_chart(&self) -> ChartData {
        ChartData {
            labels: self.points.iter().map(|&(x, _)| x).collect(),
            datasets: vec![Dataset {
                data: self.points.iter().map(|&(_, y)| y).collect(),
            }],
        }
    }
}

/// Sample a compiled expression over [SAMPLE_DOMAIN].
pub fn sample(f: &Compiled) -> SampleSet {
    SampleSet {
        points: SAMPLE_DOMAIN.map(|x| (x, f.eval(x as f64))).collect(),
    }
}

/// `{ labels: [x...], datasets: [{ data: [y...] }] }`
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<i64>,
    pub datasets: Vec<Dataset>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Dataset {
    pub data: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn folds_constant_subtrees() {
        let f = compile(&parse("(2 + 3) * x + 2^3").unwrap());
        match &f {
            Compiled::Add(l, r) => {
                assert_eq!(**r, Compiled::Const(8.0));
                assert_eq!(**l, Compiled::Mul(Box::new(Compiled::Const(5.0)), Box::new(Compiled::Var)));
            }
            other => panic!("expected Add, got {other:?}"),
        }
        assert!(compile(&parse("4 / 2 - 1").unwrap()).is_constant());
    }

    #[test]
    fn evaluates_polynomial() {
        let f = compile(&parse("x^2 - 3x + 2").unwrap());
        assert_eq!(f.eval(0.0), 2.0);
        assert_eq!(f.eval(1.0), 0.0);
        assert_eq!(f.eval(-2.0), 12.0);
        assert_eq!(compile(&parse("x / 4").unwrap()).eval(2.0), 0.5);
    }

    #[test]
    fn sample_covers_fixed_domain() {
        let s = sample(&compile(&parse("2x + 1").unwrap()));
        assert_eq!(s.len(), 201);
        assert_eq!(s.points()[0], (-100, -199.0));
        assert_eq!(s.points()[100], (0, 1.0));
        assert_eq!(s.points()[200], (100, 201.0));
    }

    #[test]
    fn chart_payload_shape() {
        let chart = sample(&compile(&parse("x^2").unwrap())).to_chart();
        assert_eq!(chart.labels.len(), 201);
        assert_eq!(chart.datasets.len(), 1);
        assert_eq!(chart.datasets[0].data[100], 0.0);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["labels"][0], -100);
        assert_eq!(json["datasets"][0]["data"][0], 10000.0);
    }
}
