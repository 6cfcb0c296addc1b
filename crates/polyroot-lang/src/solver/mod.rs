//! Reference solver: roots with multiplicities and the factorization normal form.
//!
//! Numeric policy every solver backend must follow:
//! - roots ascend by real part, ties by imaginary part;
//! - a root within ε of an already emitted root adds to that root's multiplicity,
//!   with ε = `root_tolerance × max(1, Cauchy bound)`;
//! - complex roots are always reported; imaginary parts within ε are snapped to 0;
//! - a nonzero constant has no roots, and the zero polynomial is its own case.

mod aberth;
mod squarefree;

pub use aberth::find_roots;
pub use squarefree::{squarefree_decomposition, total_degree, SquarefreeFactor};

use crate::config::SolverConfig;
use crate::error::EngineError;
use crate::format::{format_complex, format_real};
use crate::parser::DEFAULT_VARIABLE;
use crate::poly::NormalForm;
use num_complex::Complex64;
use std::cmp::Ordering;
use std::fmt;

/// Rounding error allowance, in ulps per coefficient, when shifting a polynomial to a root.
const TAYLOR_ULPS: f64 = 16.0;

/// A distinct root and how many times it repeats.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Root {
    pub value: Complex64,
    pub multiplicity: u32,
}

impl Root {
    pub fn new(value: Complex64, multiplicity: u32) -> Self {
        Self {
            value,
            multiplicity,
        }
    }

    pub fn real(value: f64, multiplicity: u32) -> Self {
        Self::new(Complex64::new(value, 0.0), multiplicity)
    }

    pub fn is_real(&self) -> bool {
        self.value.im == 0.0
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_complex(self.value))?;
        if self.multiplicity > 1 {
            write!(f, " (multiplicity {})", self.multiplicity)?;
        }
        Ok(())
    }
}

/// `leading · Π (x - rᵢ)^mᵢ`, factors in root order.
#[derive(Clone, PartialEq, Debug)]
pub struct Factorization {
    pub leading: f64,
    pub factors: Vec<Root>,
}

impl Factorization {
    /// Multiply the factors back out; complex coefficients, lowest degree first.
    pub fn expand(&self) -> Vec<Complex64> {
        let mut acc = vec![Complex64::new(self.leading, 0.0)];
        for root in &self.factors {
            for _ in 0..root.multiplicity {
                let mut next = vec![Complex64::new(0.0, 0.0); acc.len() + 1];
                for (i, c) in acc.iter().enumerate() {
                    next[i + 1] += c;
                    next[i] -= c * root.value;
                }
                acc = next;
            }
        }
        acc
    }

    /// Real part of the expansion as a normal form (exact when every root is real or
    /// complex roots come in conjugate pairs).
    pub fn to_normal_form(&self) -> NormalForm {
        let re: Vec<f64> = self.expand().iter().map(|c| c.re).collect();
        NormalForm::from_dense(&re)
    }

    /// Render in the given variable, e.g. "2(x - 1)^2(x + 3)".
    pub fn render(&self, variable: &str) -> String {
        let mut out = match format_real(self.leading).as_str() {
            "1" => String::new(),
            "-1" => "-".to_string(),
            other => other.to_string(),
        };
        for root in &self.factors {
            out.push_str(&render_factor(root, variable));
        }
        out
    }
}

fn render_factor(root: &Root, variable: &str) -> String {
    let base = if format_complex(root.value) == "0" {
        variable.to_string()
    } else if root.is_real() {
        if root.value.re > 0.0 {
            format!("({variable} - {})", format_real(root.value.re))
        } else {
            format!("({variable} + {})", format_real(-root.value.re))
        }
    } else {
        format!("({variable} - ({}))", format_complex(root.value))
    };
    if root.multiplicity > 1 {
        format!("{base}^{}", root.multiplicity)
    } else {
        base
    }
}

impl fmt::Display for Factorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_VARIABLE))
    }
}

/// Outcome of solving one normal form. The three cases never overlap.
#[derive(Clone, PartialEq, Debug)]
pub enum Solution {
    /// Degree ≥ 1.
    Roots {
        roots: Vec<Root>,
        factorization: Factorization,
    },
    /// Nonzero constant: no roots.
    Constant(f64),
    /// Every value of the variable is a root; not the same thing as "no roots".
    IdenticallyZero,
}

impl Solution {
    pub fn roots(&self) -> &[Root] {
        match self {
            Solution::Roots { roots, .. } => roots,
            Solution::Constant(_) | Solution::IdenticallyZero => &[],
        }
    }

    pub fn multiplicity_sum(&self) -> u32 {
        self.roots().iter().map(|r| r.multiplicity).sum()
    }

    /// One display string per distinct root.
    pub fn root_labels(&self) -> Vec<String> {
        self.roots().iter().map(Root::to_string).collect()
    }

    pub fn factorization_label(&self, variable: &str) -> String {
        match self {
            Solution::Roots { factorization, .. } => factorization.render(variable),
            Solution::Constant(c) => format_real(*c),
            Solution::IdenticallyZero => "0".to_string(),
        }
    }
}

/// Solve a polynomial under the numeric policy above.
pub fn solve(p: &NormalForm, config: &SolverConfig) -> Result<Solution, EngineError> {
    let Some(degree) = p.degree() else {
        return Ok(Solution::IdenticallyZero);
    };
    if degree == 0 {
        return Ok(Solution::Constant(p.leading_coefficient()));
    }

    let coeffs = p.coefficients();
    let epsilon = config.root_tolerance * cauchy_bound(&coeffs).max(1.0);
    tracing::debug!(degree, epsilon, "solving polynomial");

    let candidates = match roots_by_multiplicity(&coeffs, epsilon, config) {
        Ok(found) if found.iter().map(|&(_, m)| m as usize).sum::<usize>() == degree as usize => {
            found
        }
        outcome => {
            tracing::warn!(
                degree,
                squarefree_ok = outcome.is_ok(),
                "squarefree decomposition inconsistent; solving without it"
            );
            find_roots(&coeffs, config.max_iterations)?
                .into_iter()
                .map(|z| (z, 1))
                .collect()
        }
    };

    let roots = cluster(candidates, epsilon);
    Ok(Solution::Roots {
        factorization: Factorization {
            leading: p.leading_coefficient(),
            factors: roots.clone(),
        },
        roots,
    })
}

/// Roots of every squarefree factor, each tagged with the factor's multiplicity.
///
/// The decomposition merges roots at the gcd tolerance, which knows nothing about ε. A
/// repeated root is kept only if the roots of `p` around it all lie within ε; otherwise it
/// is replaced by the nearest roots of `p` itself, each with multiplicity 1.
fn roots_by_multiplicity(
    coeffs: &[f64],
    epsilon: f64,
    config: &SolverConfig,
) -> Result<Vec<(Complex64, u32)>, EngineError> {
    let factors = squarefree_decomposition(coeffs);
    if total_degree(&factors) != coeffs.len() - 1 {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut unconfirmed = Vec::new();
    for f in &factors {
        for z in find_roots(&f.factor, config.max_iterations)? {
            if f.multiplicity > 1 && cluster_radius(coeffs, z, f.multiplicity as usize) > epsilon {
                unconfirmed.push((z, f.multiplicity));
            } else {
                out.push((z, f.multiplicity));
            }
        }
    }
    if unconfirmed.is_empty() {
        return Ok(out);
    }

    tracing::debug!(
        count = unconfirmed.len(),
        epsilon,
        "repeated roots spread wider than tolerance; splitting"
    );
    let direct = find_roots(coeffs, config.max_iterations)?;
    let mut taken = vec![false; direct.len()];
    for (z, m) in unconfirmed {
        for _ in 0..m {
            let nearest = (0..direct.len())
                .filter(|&j| !taken[j])
                .min_by(|&a, &b| (direct[a] - z).norm().total_cmp(&(direct[b] - z).norm()));
            if let Some(j) = nearest {
                taken[j] = true;
                out.push((direct[j], 1));
            }
        }
    }
    Ok(out)
}

/// Taylor coefficients of `p` around `r`, up to degree `m`: `p(r + t) = Σ tₖ·tᵏ`.
fn taylor_coefficients(coeffs: &[Complex64], r: Complex64, m: usize) -> Vec<Complex64> {
    let mut work = coeffs.to_vec();
    let mut out = Vec::with_capacity(m + 1);
    for _ in 0..=m {
        let Some(&top) = work.last() else {
            out.push(Complex64::new(0.0, 0.0));
            continue;
        };
        // Synthetic division by (x - r): the remainder is the next coefficient.
        let mut quotient = vec![Complex64::new(0.0, 0.0); work.len() - 1];
        let mut acc = top;
        for i in (0..work.len() - 1).rev() {
            quotient[i] = acc;
            acc = acc * r + work[i];
        }
        out.push(acc);
        work = quotient;
    }
    out
}

/// Upper bound on the distance from `r` to the `m` roots of `p` nearest to it, read off
/// the Taylor expansion at `r`. Lower coefficients below their rounding error count as 0.
fn cluster_radius(coeffs: &[f64], r: Complex64, m: usize) -> f64 {
    let exact: Vec<Complex64> = coeffs.iter().map(|&c| Complex64::new(c, 0.0)).collect();
    let magnitudes: Vec<Complex64> = coeffs.iter().map(|&c| Complex64::new(c.abs(), 0.0)).collect();
    let t = taylor_coefficients(&exact, r, m);
    let bound = taylor_coefficients(&magnitudes, Complex64::new(r.norm(), 0.0), m);
    let rounding = TAYLOR_ULPS * coeffs.len() as f64 * f64::EPSILON;

    let lead = t[m].norm();
    if lead <= rounding * bound[m].re {
        return f64::INFINITY;
    }
    (0..m)
        .map(|k| {
            let tk = (t[k].norm() - rounding * bound[k].re).max(0.0);
            2.0 * (tk / lead).powf(1.0 / (m - k) as f64)
        })
        .fold(0.0, f64::max)
}

/// 1 + max |cᵢ / cₙ|: every root lies within this radius.
fn cauchy_bound(coeffs: &[f64]) -> f64 {
    let n = coeffs.len() - 1;
    let lead = coeffs[n].abs();
    1.0 + coeffs[..n].iter().fold(0.0_f64, |m, c| m.max(c.abs() / lead))
}

fn root_order(a: &Root, b: &Root) -> Ordering {
    a.value
        .re
        .total_cmp(&b.value.re)
        .then(a.value.im.total_cmp(&b.value.im))
}

/// Snap near-real roots, merge roots within ε, make conjugate pairs exact, sort.
fn cluster(candidates: Vec<(Complex64, u32)>, epsilon: f64) -> Vec<Root> {
    let mut sorted: Vec<Root> = candidates
        .into_iter()
        .map(|(mut z, m)| {
            if z.im.abs() <= epsilon {
                z.im = 0.0;
            }
            if z.re == 0.0 {
                z.re = 0.0; // -0.0
            }
            Root::new(z, m)
        })
        .collect();
    sorted.sort_by(root_order);

    let mut emitted: Vec<Root> = Vec::with_capacity(sorted.len());
    for root in sorted {
        match emitted
            .iter_mut()
            .find(|e| (e.value - root.value).norm() <= epsilon)
        {
            Some(existing) => existing.multiplicity += root.multiplicity,
            None => emitted.push(root),
        }
    }

    pair_conjugates(&mut emitted, epsilon);
    emitted.sort_by(root_order);
    emitted
}

fn pair_conjugates(roots: &mut [Root], epsilon: f64) {
    let mut paired = vec![false; roots.len()];
    for i in 0..roots.len() {
        if paired[i] || roots[i].value.im <= 0.0 {
            continue;
        }
        let partner = (0..roots.len())
            .filter(|&j| !paired[j] && roots[j].value.im < 0.0)
            .filter(|&j| roots[j].multiplicity == roots[i].multiplicity)
            .filter(|&j| (roots[j].value.conj() - roots[i].value).norm() <= epsilon)
            .min_by(|&a, &b| {
                let da = (roots[a].value.conj() - roots[i].value).norm();
                let db = (roots[b].value.conj() - roots[i].value).norm();
                da.total_cmp(&db)
            });
        if let Some(j) = partner {
            let re = (roots[i].value.re + roots[j].value.re) / 2.0;
            let im = (roots[i].value.im - roots[j].value.im) / 2.0;
            roots[i].value = Complex64::new(re, im);
            roots[j].value = Complex64::new(re, -im);
            paired[i] = true;
            paired[j] = true;
        }
    }
}
