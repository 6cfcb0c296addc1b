//! Polynomial normal form: the canonical, degree-ordered coefficient list of an expression.
//!
//! All transformations are pure: `Expr` in, `NormalForm` out. Expansion accumulates
//! coefficients in a degree-keyed map so like terms collapse as they are produced.

pub mod dense;

use crate::error::EngineError;
use crate::format::format_real;
use crate::ir::{powu, Expr};
use crate::parser::DEFAULT_VARIABLE;
use num_complex::Complex64;
use std::collections::BTreeMap;
use std::fmt;

/// Default ceiling on the degree produced by expansion.
pub const DEFAULT_MAX_DEGREE: u32 = 64;

/// Coefficients smaller than this many ulps of the largest contribution to their degree
/// are treated as cancelled ("0.1x + 0.2x - 0.3x" has no degree-1 term).
const CANCELLATION_ULPS: f64 = 8.0;

/// Canonical polynomial: `(degree, coefficient)` pairs, degrees strictly decreasing,
/// no zero coefficients. The empty list is the zero polynomial.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct NormalForm {
    terms: Vec<(u32, f64)>,
}

impl NormalForm {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(c: f64) -> Self {
        Self::from_terms([(0, c)])
    }

    /// Build from arbitrary `(degree, coefficient)` pairs: like degrees are summed,
    /// zeros dropped, result sorted by descending degree.
    pub fn from_terms(terms: impl IntoIterator<Item = (u32, f64)>) -> Self {
        let mut map: BTreeMap<u32, f64> = BTreeMap::new();
        for (d, c) in terms {
            *map.entry(d).or_insert(0.0) += c;
        }
        Self::from_map(map.into_iter())
    }

    /// From dense coefficients, lowest degree first.
    pub fn from_dense(coeffs: &[f64]) -> Self {
        Self::from_map(coeffs.iter().enumerate().map(|(d, &c)| (d as u32, c)))
    }

    fn from_map(ascending: impl DoubleEndedIterator<Item = (u32, f64)>) -> Self {
        NormalForm {
            terms: ascending.rev().filter(|&(_, c)| c != 0.0).collect(),
        }
    }

    pub fn terms(&self) -> &[(u32, f64)] {
        &self.terms
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Degree, or None for the zero polynomial.
    pub fn degree(&self) -> Option<u32> {
        self.terms.first().map(|&(d, _)| d)
    }

    /// Coefficient of the highest degree term (0 for the zero polynomial).
    pub fn leading_coefficient(&self) -> f64 {
        self.terms.first().map_or(0.0, |&(_, c)| c)
    }

    pub fn coefficient(&self, degree: u32) -> f64 {
        self.terms
            .iter()
            .find(|&&(d, _)| d == degree)
            .map_or(0.0, |&(_, c)| c)
    }

    /// Dense coefficients, lowest degree first. Empty for the zero polynomial.
    pub fn coefficients(&self) -> Vec<f64> {
        let Some(deg) = self.degree() else {
            return Vec::new();
        };
        let mut dense = vec![0.0; deg as usize + 1];
        for &(d, c) in &self.terms {
            dense[d as usize] = c;
        }
        dense
    }

    /// Horner evaluation over the sparse terms.
    pub fn eval(&self, x: f64) -> f64 {
        let mut acc = 0.0;
        let mut prev = match self.degree() {
            Some(d) => d,
            None => return 0.0,
        };
        for &(d, c) in &self.terms {
            acc = acc * powu(x, prev - d) + c;
            prev = d;
        }
        acc * powu(x, prev)
    }

    pub fn eval_complex(&self, z: Complex64) -> Complex64 {
        let mut acc = Complex64::new(0.0, 0.0);
        let mut prev = match self.degree() {
            Some(d) => d,
            None => return acc,
        };
        for &(d, c) in &self.terms {
            acc = acc * z.powu(prev - d) + c;
            prev = d;
        }
        acc * z.powu(prev)
    }

    /// Term-by-term comparison; each pair may differ by `tolerance` absolutely, or
    /// relative to the larger magnitude when that exceeds 1.
    pub fn approx_eq(&self, other: &NormalForm, tolerance: f64) -> bool {
        let mut degrees: Vec<u32> = self
            .terms
            .iter()
            .chain(&other.terms)
            .map(|&(d, _)| d)
            .collect();
        degrees.sort_unstable();
        degrees.dedup();
        degrees.into_iter().all(|d| {
            let a = self.coefficient(d);
            let b = other.coefficient(d);
            (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0)
        })
    }

    /// Render in the given variable, e.g. "x^2 - 3x + 2".
    pub fn render(&self, variable: &str) -> String {
        if self.terms.is_empty() {
            return "0".to_string();
        }
        let mut out = String::new();
        for (i, &(d, c)) in self.terms.iter().enumerate() {
            let magnitude = c.abs();
            if i == 0 {
                if c < 0.0 {
                    out.push('-');
                }
            } else {
                out.push_str(if c < 0.0 { " - " } else { " + " });
            }
            let coef = format_real(magnitude);
            if d == 0 || coef != "1" {
                out.push_str(&coef);
            }
            match d {
                0 => {}
                1 => out.push_str(variable),
                _ => {
                    out.push_str(variable);
                    out.push('^');
                    out.push_str(&d.to_string());
                }
            }
        }
        out
    }
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_VARIABLE))
    }
}

/// Running sum for one degree plus the total magnitude that went into it, so that
/// floating cancellation can be told apart from a genuinely small coefficient.
#[derive(Clone, Copy, Default, Debug)]
struct Coeff {
    value: f64,
    magnitude: f64,
}

impl Coeff {
    fn is_live(&self) -> bool {
        self.value.abs() > CANCELLATION_ULPS * f64::EPSILON * self.magnitude
    }
}

type Expansion = BTreeMap<u32, Coeff>;

/// Expand an expression into its normal form with [DEFAULT_MAX_DEGREE] as the degree ceiling.
pub fn normalize(expr: &Expr) -> Result<NormalForm, EngineError> {
    normalize_with_limit(expr, DEFAULT_MAX_DEGREE)
}

/// Expand an expression into its normal form.
///
/// Fails with `NotPolynomial` if the variable appears in a denominator, with `Domain`
/// on division by a zero constant or when the degree would exceed `max_degree`.
pub fn normalize_with_limit(expr: &Expr, max_degree: u32) -> Result<NormalForm, EngineError> {
    let expansion = expand(expr, max_degree)?;
    Ok(NormalForm {
        terms: expansion
            .into_iter()
            .rev()
            .filter(|(_, c)| c.is_live())
            .map(|(d, c)| (d, c.value))
            .collect(),
    })
}

fn expand(expr: &Expr, max_degree: u32) -> Result<Expansion, EngineError> {
    match expr {
        Expr::Const(c) => Ok(single(0, c.into_inner())),
        Expr::Var => Ok(single(1, 1.0)),
        Expr::Add(l, r) => Ok(add(expand(l, max_degree)?, &expand(r, max_degree)?, 1.0)),
        Expr::Sub(l, r) => Ok(add(expand(l, max_degree)?, &expand(r, max_degree)?, -1.0)),
        Expr::Neg(inner) => Ok(scale(expand(inner, max_degree)?, -1.0)),
        Expr::Mul(l, r) => mul(&expand(l, max_degree)?, &expand(r, max_degree)?, max_degree),
        Expr::Div(l, r) => {
            let numerator = expand(l, max_degree)?;
            let denominator = expand(r, max_degree)?;
            if top_degree(&denominator) > 0 {
                return Err(EngineError::NotPolynomial(
                    "the variable appears in a denominator".to_string(),
                ));
            }
            let divisor = denominator
                .get(&0)
                .filter(|c| c.is_live())
                .map_or(0.0, |c| c.value);
            if divisor == 0.0 {
                return Err(EngineError::Domain("division by zero".to_string()));
            }
            Ok(scale(numerator, 1.0 / divisor))
        }
        Expr::Pow(base, n) => {
            let base = expand(base, max_degree)?;
            let base_degree = top_degree(&base);
            if u64::from(base_degree) * u64::from(*n) > u64::from(max_degree) {
                return Err(EngineError::Domain(format!(
                    "degree {} exceeds the limit of {max_degree}",
                    u64::from(base_degree) * u64::from(*n)
                )));
            }
            pow(base, *n, max_degree)
        }
    }
}

fn single(degree: u32, value: f64) -> Expansion {
    let mut map = Expansion::new();
    map.insert(
        degree,
        Coeff {
            value,
            magnitude: value.abs(),
        },
    );
    map
}

fn top_degree(p: &Expansion) -> u32 {
    p.iter()
        .rev()
        .find(|(_, c)| c.is_live())
        .map_or(0, |(&d, _)| d)
}

fn add(mut acc: Expansion, rhs: &Expansion, sign: f64) -> Expansion {
    for (&d, c) in rhs {
        let slot = acc.entry(d).or_default();
        slot.value += sign * c.value;
        slot.magnitude += c.magnitude;
    }
    acc
}

fn scale(mut p: Expansion, k: f64) -> Expansion {
    for c in p.values_mut() {
        c.value *= k;
        c.magnitude *= k.abs();
    }
    p
}

fn mul(a: &Expansion, b: &Expansion, max_degree: u32) -> Result<Expansion, EngineError> {
    let degree = u64::from(top_degree(a)) + u64::from(top_degree(b));
    if degree > u64::from(max_degree) {
        return Err(EngineError::Domain(format!(
            "degree {degree} exceeds the limit of {max_degree}"
        )));
    }
    // Cancelled entries are skipped, otherwise they would multiply through repeated squaring.
    let mut out = Expansion::new();
    for (&da, ca) in a.iter().filter(|(_, c)| c.is_live()) {
        for (&db, cb) in b.iter().filter(|(_, c)| c.is_live()) {
            let slot = out.entry(da + db).or_default();
            slot.value += ca.value * cb.value;
            slot.magnitude += ca.magnitude * cb.magnitude;
        }
    }
    Ok(out)
}

/// Square-and-multiply.
fn pow(base: Expansion, mut n: u32, max_degree: u32) -> Result<Expansion, EngineError> {
    let mut result = single(0, 1.0);
    let mut square = base;
    while n > 0 {
        if n & 1 == 1 {
            result = mul(&result, &square, max_degree)?;
        }
        n >>= 1;
        if n > 0 {
            square = mul(&square, &square, max_degree)?;
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::parse;

    fn nf(input: &str) -> NormalForm {
        normalize(&parse(input).unwrap()).unwrap()
    }

    #[test]
    fn collects_like_terms_in_descending_order() {
        assert_eq!(nf("2 + x + 3x + x^2").terms(), &[(2, 1.0), (1, 4.0), (0, 2.0)]);
    }

    #[test]
    fn expands_products() {
        assert_eq!(nf("(x-1)(x-2)").terms(), &[(2, 1.0), (1, -3.0), (0, 2.0)]);
        assert_eq!(nf("(x+1)^3").terms(), &[(3, 1.0), (2, 3.0), (1, 3.0), (0, 1.0)]);
    }

    #[test]
    fn cancelled_terms_do_not_grow_powers() {
        assert_eq!(nf("(0x + 1)^100000"), NormalForm::constant(1.0));
        assert_eq!(nf("(x - x + 1)^100000"), NormalForm::constant(1.0));
        assert_eq!(nf("((x - x)x + 2)^40"), NormalForm::constant(2f64.powi(40)));
    }

    #[test]
    fn equivalent_expressions_share_a_normal_form() {
        assert_eq!(nf("x^2 - 3x + 2"), nf("(x-1)(x-2)"));
        assert_eq!(nf("2(x+1) - 2"), nf("2x"));
        assert_eq!(nf("-(x - 1)"), nf("1 - x"));
    }

    #[test]
    fn zero_terms_are_dropped() {
        assert!(nf("x - x").is_zero());
        assert!(nf("0").is_zero());
        assert_eq!(nf("x^2 + 0x + 1").terms(), &[(2, 1.0), (0, 1.0)]);
    }

    #[test]
    fn floating_cancellation_is_dropped() {
        assert_eq!(nf("0.1x + 0.2x - 0.3x + 1").terms(), &[(0, 1.0)]);
    }

    #[test]
    fn division_by_nonzero_constant() {
        assert_eq!(nf("x/2 + 1/4").terms(), &[(1, 0.5), (0, 0.25)]);
        assert_eq!(nf("(x^2 - 1)/(1 + 1)").terms(), &[(2, 0.5), (0, -0.5)]);
    }

    #[test]
    fn variable_in_denominator_is_not_polynomial() {
        let e = normalize(&parse("1/x").unwrap()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotPolynomial);
        let e = normalize(&parse("x/(x+1)").unwrap()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::NotPolynomial);
    }

    #[test]
    fn denominator_that_cancels_to_constant_is_allowed() {
        assert_eq!(nf("x/(x - x + 2)").terms(), &[(1, 0.5)]);
    }

    #[test]
    fn division_by_zero_is_domain_error() {
        let e = normalize(&parse("x/0").unwrap()).unwrap_err();
        assert_eq!(e, EngineError::Domain("division by zero".to_string()));
        let e = normalize(&parse("x/(1 - 1)").unwrap()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Domain);
    }

    #[test]
    fn degree_limit() {
        assert!(normalize_with_limit(&parse("x^4").unwrap(), 4).is_ok());
        let e = normalize_with_limit(&parse("(x^2)^3").unwrap(), 4).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Domain);
        let e = normalize_with_limit(&parse("x^3 x^2").unwrap(), 4).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Domain);
    }

    #[test]
    fn degree_and_leading_coefficient() {
        let p = nf("-2x^3 + x");
        assert_eq!(p.degree(), Some(3));
        assert_eq!(p.leading_coefficient(), -2.0);
        assert_eq!(p.coefficients(), vec![0.0, 1.0, 0.0, -2.0]);
        assert_eq!(NormalForm::zero().degree(), None);
    }

    #[test]
    fn dense_round_trip() {
        let p = nf("x^3 - 2x + 5");
        assert_eq!(NormalForm::from_dense(&p.coefficients()), p);
    }

    #[test]
    fn horner_matches_direct_evaluation() {
        let p = nf("3x^4 - x^2 + 7");
        for x in [-3.0_f64, -0.5, 0.0, 1.0, 2.5] {
            let direct = 3.0 * x.powi(4) - x * x + 7.0;
            assert!((p.eval(x) - direct).abs() < 1e-9);
        }
        let z = Complex64::new(0.0, 1.0);
        // 3 - (-1) + 7
        assert!((p.eval_complex(z) - Complex64::new(11.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn approx_eq_tolerates_accumulation() {
        let a = NormalForm::from_terms([(2, 1.0), (0, 2.0)]);
        let b = NormalForm::from_terms([(2, 1.0 + 1e-12), (1, 1e-13), (0, 2.0)]);
        assert!(a.approx_eq(&b, 1e-9));
        assert!(!a.approx_eq(&NormalForm::from_terms([(2, 1.0)]), 1e-9));
    }

    #[test]
    fn render() {
        assert_eq!(nf("x^2 - 3x + 2").to_string(), "x^2 - 3x + 2");
        assert_eq!(nf("-x^3 + 0.5").to_string(), "-x^3 + 0.5");
        assert_eq!(NormalForm::from_terms([(1, 2.0), (0, -1.0)]).render("t"), "2t - 1");
        assert_eq!(NormalForm::zero().to_string(), "0");
    }
}
