//! Engine configuration. Every field has a default; JSON input may set any subset.

use crate::error::EngineError;
use crate::parser::DEFAULT_VARIABLE;
use crate::poly::DEFAULT_MAX_DEGREE;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the single free variable.
    pub variable: String,
    /// Largest degree expansion may produce before failing with a domain error.
    pub max_degree: u32,
    pub solver: SolverConfig,
}

/// Numeric policy of the reference solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// ε before scaling: roots closer than `root_tolerance × max(1, Cauchy bound)` are one root.
    pub root_tolerance: f64,
    /// Iteration budget for the simultaneous root iteration.
    pub max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variable: DEFAULT_VARIABLE.to_string(),
            max_degree: DEFAULT_MAX_DEGREE,
            solver: SolverConfig::default(),
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            root_tolerance: 1e-6,
            max_iterations: 500,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let ident_ok = self
            .variable
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && self
                .variable
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_');
        if !ident_ok {
            return Err(EngineError::Config(format!(
                "variable '{}' is not an identifier",
                self.variable
            )));
        }
        if !(self.solver.root_tolerance > 0.0 && self.solver.root_tolerance < 1.0) {
            return Err(EngineError::Config(format!(
                "root_tolerance must be in (0, 1), got {}",
                self.solver.root_tolerance
            )));
        }
        if self.solver.max_iterations == 0 {
            return Err(EngineError::Config("max_iterations must be positive".to_string()));
        }
        Ok(())
    }
}
