//! Property-based tests for normalization and the solver contract.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::config::SolverConfig;
    use crate::eval::compile;
    use crate::ir::Expr;
    use crate::parser::parse;
    use crate::poly::{dense, normalize, NormalForm};
    use crate::solver::{solve, Solution};

    // Integer leaves keep every intermediate value exact in f64.
    fn polynomial_expr() -> impl Strategy<Value = Expr> {
        let leaf = prop_oneof![
            (-3i32..=3).prop_map(|c| Expr::constant(f64::from(c))),
            Just(Expr::Var),
        ];
        leaf.prop_recursive(3, 16, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone())
                    .prop_map(|(l, r)| Expr::Add(Box::new(l), Box::new(r))),
                (inner.clone(), inner.clone())
                    .prop_map(|(l, r)| Expr::Sub(Box::new(l), Box::new(r))),
                (inner.clone(), inner.clone())
                    .prop_map(|(l, r)| Expr::Mul(Box::new(l), Box::new(r))),
                inner.clone().prop_map(|e| Expr::Neg(Box::new(e))),
                (inner, 0u32..=2).prop_map(|(b, n)| Expr::Pow(Box::new(b), n)),
            ]
        })
    }

    fn integer_roots() -> impl Strategy<Value = Vec<i32>> {
        prop::collection::vec(-4i32..=4, 1..=4)
    }

    fn leading() -> impl Strategy<Value = i32> {
        prop_oneof![(-3i32..=-1), (1i32..=3)]
    }

    fn from_roots(lead: i32, roots: &[i32]) -> NormalForm {
        let dense = roots
            .iter()
            .fold(vec![f64::from(lead)], |acc, &r| dense::mul(&acc, &[-f64::from(r), 1.0]));
        NormalForm::from_dense(&dense)
    }

    proptest! {
        #[test]
        fn normal_form_evaluates_like_the_tree(expr in polynomial_expr(), x in -2i32..=2) {
            let x = f64::from(x);
            let p = normalize(&expr).unwrap();
            let direct = compile(&expr).eval(x);
            let expanded = p.eval(x);
            prop_assert!(
                (direct - expanded).abs() <= 1e-9 * direct.abs().max(1.0),
                "{direct} vs {expanded} for {expr:?}"
            );
        }

        #[test]
        fn product_and_expansion_normalize_identically(roots in integer_roots()) {
            let product: String = roots.iter().map(|r| format!("(x - ({r}))")).collect();
            let p = normalize(&parse(&product).unwrap()).unwrap();
            let expanded = normalize(&parse(&p.to_string()).unwrap()).unwrap();
            prop_assert_eq!(&p, &expanded);
            prop_assert_eq!(p, from_roots(1, &roots));
        }

        #[test]
        fn multiplicities_sum_to_degree(lead in leading(), roots in integer_roots()) {
            let p = from_roots(lead, &roots);
            let solution = solve(&p, &SolverConfig::default()).unwrap();
            prop_assert_eq!(solution.multiplicity_sum() as usize, roots.len());
        }

        #[test]
        fn arbitrary_coefficients_keep_multiplicity_sum(
            coeffs in prop::collection::vec(-10i32..=10, 1..=6),
            lead in leading(),
        ) {
            let mut dense: Vec<f64> = coeffs.into_iter().map(f64::from).collect();
            dense.push(f64::from(lead));
            let p = NormalForm::from_dense(&dense);
            let solution = solve(&p, &SolverConfig::default()).unwrap();
            prop_assert_eq!(solution.multiplicity_sum(), p.degree().unwrap_or(0));
        }

        #[test]
        fn real_factorization_expands_back(lead in leading(), roots in integer_roots()) {
            let p = from_roots(lead, &roots);
            match solve(&p, &SolverConfig::default()).unwrap() {
                Solution::Roots { roots: found, factorization } => {
                    prop_assert!(found.iter().all(|r| r.is_real()), "{found:?}");
                    prop_assert!(
                        found.windows(2).all(|w| w[0].value.re < w[1].value.re),
                        "{found:?}"
                    );
                    prop_assert!(factorization.to_normal_form().approx_eq(&p, 1e-6));
                }
                other => prop_assert!(false, "expected roots, got {:?}", other),
            }
        }

        #[test]
        fn constants_have_no_roots(c in -100i32..=100) {
            let p = normalize(&Expr::constant(f64::from(c))).unwrap();
            let solution = solve(&p, &SolverConfig::default()).unwrap();
            prop_assert!(solution.roots().is_empty());
            prop_assert_eq!(c == 0, solution == Solution::IdenticallyZero);
        }
    }
}
