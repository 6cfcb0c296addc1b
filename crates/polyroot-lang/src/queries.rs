//! Query group: parse, normalize and sample an equation.
//!
//! Each typed equation is one [EquationDef] input. Retyping it updates the input in place,
//! and Salsa recomputes only the queries that read the changed fields.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::eval::{self, SampleSet};
use crate::ir::{EquationDef, Expr};
use crate::parser::parse_with_variable;
use crate::poly::{normalize_with_limit, NormalForm};
use salsa::Setter;
use std::collections::HashMap;

#[salsa::tracked]
pub fn parsed(db: &dyn salsa::Database, equation: EquationDef) -> Result<Expr, EngineError> {
    parse_with_variable(equation.text(db), equation.variable(db))
}

/// Normal form of the equation; fails for anything that is not a polynomial.
#[salsa::tracked]
pub fn normal_form(
    db: &dyn salsa::Database,
    equation: EquationDef,
) -> Result<NormalForm, EngineError> {
    let expr = parsed(db, equation)?;
    normalize_with_limit(&expr, equation.max_degree(db))
}

/// Curve samples. Gated on [normal_form] so non-polynomial input never reaches the evaluator.
#[salsa::tracked]
pub fn samples(db: &dyn salsa::Database, equation: EquationDef) -> Result<SampleSet, EngineError> {
    normal_form(db, equation)?;
    let expr = parsed(db, equation)?;
    Ok(eval::sample(&eval::compile(&expr)))
}

/// Database plus one input per slot, so the same slot can be re-typed incrementally.
pub struct Engine {
    db: salsa::DatabaseImpl,
    config: EngineConfig,
    inputs: HashMap<String, EquationDef>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            db: salsa::DatabaseImpl::new(),
            config,
            inputs: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set the text of `slot`, creating the input on first use.
    pub fn define(&mut self, slot: &str, text: &str) -> EquationDef {
        if let Some(&equation) = self.inputs.get(slot) {
            if equation.text(&self.db) != text {
                equation.set_text(&mut self.db).to(text.to_string());
            }
            return equation;
        }
        let equation = EquationDef::new(
            &self.db,
            text.to_string(),
            self.config.variable.clone(),
            self.config.max_degree,
        );
        self.inputs.insert(slot.to_string(), equation);
        equation
    }

    pub fn parse(&mut self, slot: &str, text: &str) -> Result<Expr, EngineError> {
        let equation = self.define(slot, text);
        parsed(&self.db, equation)
    }

    pub fn normal_form(&mut self, slot: &str, text: &str) -> Result<NormalForm, EngineError> {
        let equation = self.define(slot, text);
        normal_form(&self.db, equation)
    }

    pub fn samples(&mut self, slot: &str, text: &str) -> Result<SampleSet, EngineError> {
        let equation = self.define(slot, text);
        samples(&self.db, equation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn normal_form_of_product() {
        let mut engine = Engine::default();
        let p = engine.normal_form("main", "(x - 1)(x - 2)").unwrap();
        assert_eq!(p.to_string(), "x^2 - 3x + 2");
    }

    #[test]
    fn retyping_a_slot_recomputes() {
        let mut engine = Engine::default();
        assert_eq!(engine.normal_form("main", "x + 1").unwrap().to_string(), "x + 1");
        assert_eq!(engine.normal_form("main", "2x").unwrap().to_string(), "2x");
        assert_eq!(engine.normal_form("main", "x + 1").unwrap().to_string(), "x + 1");
    }

    #[test]
    fn slots_are_independent() {
        let mut engine = Engine::default();
        let a = engine.define("a", "x");
        let b = engine.define("b", "x^2");
        assert!(a != b);
        assert!(engine.define("a", "x") == a);
    }

    #[test]
    fn samples_require_a_polynomial() {
        let mut engine = Engine::default();
        let err = engine.samples("main", "1/x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotPolynomial);
        let err = engine.samples("main", "x/0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(engine.samples("main", "x^2").unwrap().len(), 201);
    }

    #[test]
    fn configured_variable_is_used() {
        let config = EngineConfig {
            variable: "t".to_string(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config);
        assert!(engine.parse("main", "t^2 + 1").is_ok());
        assert_eq!(engine.parse("main", "x").unwrap_err().kind(), ErrorKind::Syntax);
    }
}
