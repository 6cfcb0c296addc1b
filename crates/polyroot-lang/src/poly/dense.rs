//! Dense real polynomials as coefficient slices, lowest degree first.
//!
//! Floating-point versions of the exact routines a CAS would use: every operation that
//! can cancel (remainders, differences) takes a tolerance and trims coefficients that
//! vanish relative to the operands.

/// Relative size under which a computed coefficient is treated as cancelled.
pub const GCD_TOLERANCE: f64 = 1e-9;

/// Largest absolute coefficient (0 for the zero polynomial).
pub fn norm(p: &[f64]) -> f64 {
    p.iter().fold(0.0_f64, |m, c| m.max(c.abs()))
}

/// Drop trailing (highest degree) coefficients whose magnitude is at most `tol`.
pub fn trim(mut p: Vec<f64>, tol: f64) -> Vec<f64> {
    while p.last().is_some_and(|c| c.abs() <= tol) {
        p.pop();
    }
    p
}

/// Degree of a trimmed polynomial; the zero polynomial (empty) has degree 0 here.
pub fn degree(p: &[f64]) -> usize {
    p.len().saturating_sub(1)
}

pub fn derivative(p: &[f64]) -> Vec<f64> {
    p.iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| c * i as f64)
        .collect()
}

pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    let n = a.len().max(b.len());
    (0..n)
        .map(|i| a.get(i).copied().unwrap_or(0.0) - b.get(i).copied().unwrap_or(0.0))
        .collect()
}

pub fn mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Scale so the leading coefficient is 1. Returns the input unchanged if it is zero.
pub fn make_monic(p: &[f64]) -> Vec<f64> {
    match p.last() {
        Some(&lead) if lead != 0.0 => p.iter().map(|c| c / lead).collect(),
        _ => p.to_vec(),
    }
}

/// Long division `a = q·b + r` with `deg r < deg b`. `b` must be trimmed and nonzero.
pub fn div_rem(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let db = degree(b);
    let lead = b[db];
    if a.len() < b.len() {
        return (Vec::new(), a.to_vec());
    }
    let mut r = a.to_vec();
    let mut q = vec![0.0; a.len() - db];
    for k in (0..q.len()).rev() {
        let coef = r[k + db] / lead;
        q[k] = coef;
        for (j, bj) in b.iter().enumerate() {
            r[k + j] -= coef * bj;
        }
        r[k + db] = 0.0;
    }
    r.truncate(db);
    (q, r)
}

/// Monic greatest common divisor by the Euclidean algorithm. A remainder whose
/// coefficients are all within `GCD_TOLERANCE` of the dividend's norm counts as zero.
pub fn gcd(a: &[f64], b: &[f64]) -> Vec<f64> {
    let scale = norm(a).max(norm(b)).max(f64::MIN_POSITIVE);
    let mut x = trim(make_monic(a), 0.0);
    let mut y = trim(make_monic(&trim(b.to_vec(), GCD_TOLERANCE * scale)), 0.0);
    while !y.is_empty() {
        let (_, r) = div_rem(&x, &y);
        let tol = GCD_TOLERANCE * norm(&x).max(1.0);
        let r = trim(r, tol);
        x = y;
        y = make_monic(&r);
    }
    make_monic(&x)
}

/// Exact-style division when `b` is known to divide `a`; the remainder is discarded.
pub fn quotient(a: &[f64], b: &[f64]) -> Vec<f64> {
    div_rem(a, b).0
}

/// True if every coefficient is within `tol` of zero.
pub fn is_negligible(p: &[f64], tol: f64) -> bool {
    p.iter().all(|c| c.abs() <= tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_poly_eq(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn derivative_of_cubic() {
        // x^3 - 2x + 5 -> 3x^2 - 2
        assert_poly_eq(&derivative(&[5.0, -2.0, 0.0, 1.0]), &[-2.0, 0.0, 3.0]);
    }

    #[test]
    fn div_rem_by_linear() {
        // (x^2 - 3x + 2) / (x - 1) = x - 2, remainder 0
        let (q, r) = div_rem(&[2.0, -3.0, 1.0], &[-1.0, 1.0]);
        assert_poly_eq(&q, &[-2.0, 1.0]);
        assert_poly_eq(&r, &[0.0]);
    }

    #[test]
    fn div_rem_with_remainder() {
        // (x^2 + 1) / (x - 1) = x + 1, remainder 2
        let (q, r) = div_rem(&[1.0, 0.0, 1.0], &[-1.0, 1.0]);
        assert_poly_eq(&q, &[1.0, 1.0]);
        assert_poly_eq(&r, &[2.0]);
    }

    #[test]
    fn gcd_finds_repeated_factor() {
        // p = (x-1)^2 (x-2) = x^3 - 4x^2 + 5x - 2, p' = 3x^2 - 8x + 5 -> gcd = x - 1
        let p = [-2.0, 5.0, -4.0, 1.0];
        let g = gcd(&p, &derivative(&p));
        assert_poly_eq(&g, &[-1.0, 1.0]);
    }

    #[test]
    fn gcd_of_coprime_is_one() {
        let g = gcd(&[2.0, -3.0, 1.0], &[3.0, 1.0]);
        assert_poly_eq(&g, &[1.0]);
    }

    #[test]
    fn mul_and_trim() {
        assert_poly_eq(&mul(&[-1.0, 1.0], &[-2.0, 1.0]), &[2.0, -3.0, 1.0]);
        assert_eq!(trim(vec![1.0, 2.0, 1e-15], 1e-12), vec![1.0, 2.0]);
    }
}
