//! Squarefree decomposition over floating-point coefficients.
//!
//! Writes p = lc · f₁ · f₂² · f₃³ · … with each fᵢ squarefree and monic, using Yun's
//! algorithm on top of the tolerant gcd in [crate::poly::dense]. Roots of each fᵢ are
//! simple, so they can be found to full precision and tagged with multiplicity i.

use crate::poly::dense::{self, GCD_TOLERANCE};

/// A squarefree factor and the power it appears with.
#[derive(Clone, Debug, PartialEq)]
pub struct SquarefreeFactor {
    /// Monic, lowest degree first.
    pub factor: Vec<f64>,
    pub multiplicity: u32,
}

/// Yun's algorithm. `p` must be trimmed with degree ≥ 1.
///
/// 1. g = gcd(p, p'), a = p/g, b = p'/g
/// 2. loop: c = b - a'; stop when c ≈ 0 (a is the last factor);
///    d = gcd(a, c) is the factor of the current multiplicity; a = a/d, b = c/d
pub fn squarefree_decomposition(p: &[f64]) -> Vec<SquarefreeFactor> {
    let p = dense::make_monic(p);
    let n = dense::degree(&p);
    let p_prime = dense::derivative(&p);
    let g = dense::gcd(&p, &p_prime);

    if dense::degree(&g) == 0 {
        return vec![SquarefreeFactor {
            factor: p,
            multiplicity: 1,
        }];
    }

    let mut a = dense::quotient(&p, &g);
    let mut b = dense::quotient(&p_prime, &g);
    let mut factors = Vec::new();
    let mut multiplicity = 1u32;

    // Multiplicities are at most n, so n + 1 passes always reach the final factor.
    for _ in 0..=n {
        let a_prime = dense::derivative(&a);
        let c = dense::sub(&b, &a_prime);
        let scale = dense::norm(&b).max(dense::norm(&a_prime)).max(1.0);

        if dense::is_negligible(&c, GCD_TOLERANCE * scale) {
            if dense::degree(&a) > 0 {
                factors.push(SquarefreeFactor {
                    factor: a,
                    multiplicity,
                });
            }
            break;
        }

        let c = dense::trim(c, GCD_TOLERANCE * scale);
        let d = dense::gcd(&a, &c);
        if dense::degree(&d) > 0 {
            factors.push(SquarefreeFactor {
                factor: d.clone(),
                multiplicity,
            });
        }

        let next_a = dense::quotient(&a, &d);
        if dense::degree(&next_a) == 0 {
            break;
        }
        b = dense::quotient(&c, &d);
        a = next_a;
        multiplicity += 1;
    }

    factors
}

/// Σ multiplicity · degree over all factors; equals deg p when the decomposition is consistent.
pub fn total_degree(factors: &[SquarefreeFactor]) -> usize {
    factors
        .iter()
        .map(|f| f.multiplicity as usize * dense::degree(&f.factor))
        .sum()
}
