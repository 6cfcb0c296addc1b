//! Simultaneous root iteration (Aberth–Ehrlich) for real-coefficient polynomials.
//!
//! All `n` roots are refined together: each step is a Newton correction deflated by the
//! current approximations of the other roots, which keeps iterates from collapsing onto
//! the same root. Convergence is cubic for simple roots.

use crate::error::EngineError;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Relative step size at which an iterate is considered converged.
const STEP_TOLERANCE: f64 = 4.0 * f64::EPSILON;

/// Accepted backward error, in ulps of the evaluation's rounding bound.
const RESIDUAL_ULPS: f64 = 1e4;

/// Find all roots (with repetition) of the polynomial with dense coefficients `coeffs`
/// (lowest degree first). The leading coefficient must be nonzero.
pub fn find_roots(coeffs: &[f64], max_iterations: usize) -> Result<Vec<Complex64>, EngineError> {
    // Roots at zero are exact; strip them so the iteration only sees nonzero roots.
    let zeros = coeffs.iter().take_while(|&&c| c == 0.0).count();
    let coeffs = &coeffs[zeros..];
    let mut roots = vec![Complex64::new(0.0, 0.0); zeros];

    let n = coeffs.len().saturating_sub(1);
    match n {
        0 => return Ok(roots),
        1 => {
            roots.push(Complex64::new(-coeffs[0] / coeffs[1], 0.0));
            return Ok(roots);
        }
        _ => {}
    }

    let mut z = initial_guesses(coeffs);
    let mut converged = false;
    for _ in 0..max_iterations {
        let mut max_step = 0.0_f64;
        for k in 0..n {
            let (p, dp) = eval_with_derivative(coeffs, z[k]);
            if p.norm() == 0.0 {
                continue;
            }
            let repulsion: Complex64 = (0..n)
                .filter(|&j| j != k)
                .map(|j| z[k] - z[j])
                .filter(|d| d.norm() != 0.0)
                .map(|d| d.inv())
                .sum();
            let denom = dp / p - repulsion;
            let step = if denom.norm() == 0.0 {
                // Stationary point: nudge off it.
                Complex64::new(STEP_TOLERANCE, STEP_TOLERANCE) * z[k].norm().max(1.0)
            } else {
                denom.inv()
            };
            z[k] -= step;
            max_step = max_step.max(step.norm() / z[k].norm().max(1.0));
        }
        if z.iter().any(|r| !r.re.is_finite() || !r.im.is_finite()) {
            return Err(EngineError::UnsolvableNumerically(
                "root iteration produced a non-finite value".to_string(),
            ));
        }
        if max_step <= STEP_TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        // Iterates that stall at the rounding floor are still acceptable roots.
        let bad = z.iter().filter(|&&r| !is_residual_small(coeffs, r)).count();
        if bad > 0 {
            return Err(EngineError::UnsolvableNumerically(format!(
                "{bad} of {n} roots did not converge within {max_iterations} iterations"
            )));
        }
        tracing::debug!(degree = n, "root iteration stalled at rounding floor; accepting");
    }

    roots.extend(z);
    Ok(roots)
}

/// Points on a circle whose radius bounds the root moduli, rotated off the real axis.
fn initial_guesses(coeffs: &[f64]) -> Vec<Complex64> {
    let n = coeffs.len() - 1;
    let lead = coeffs[n];
    let radius = (1..=n)
        .map(|k| (coeffs[n - k] / lead).abs().powf(1.0 / k as f64))
        .fold(0.0_f64, f64::max);
    let radius = if radius > 0.0 { radius } else { 1.0 };
    (0..n)
        .map(|k| {
            let theta = 2.0 * PI * k as f64 / n as f64 + PI / (2.0 * n as f64) + 0.4;
            Complex64::from_polar(radius, theta)
        })
        .collect()
}

/// Horner evaluation of p(z) and p'(z) in one pass.
pub(crate) fn eval_with_derivative(coeffs: &[f64], z: Complex64) -> (Complex64, Complex64) {
    let mut p = Complex64::new(0.0, 0.0);
    let mut dp = Complex64::new(0.0, 0.0);
    for &c in coeffs.iter().rev() {
        dp = dp * z + p;
        p = p * z + c;
    }
    (p, dp)
}

/// |p(z)| within a multiple of the rounding error bound Σ|cᵢ||z|ⁱ·ε.
fn is_residual_small(coeffs: &[f64], z: Complex64) -> bool {
    let (p, _) = eval_with_derivative(coeffs, z);
    let r = z.norm();
    let bound: f64 = coeffs
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * r + c.abs());
    p.norm() <= RESIDUAL_ULPS * f64::EPSILON * bound
}
