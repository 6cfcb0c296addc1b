//! polyroot: polynomial expression engine (Salsa-based).

pub mod config;
pub mod contract;
pub mod error;
pub mod eval;
pub mod format;
pub mod ir;
pub mod lexer;
pub mod lifecycle;
pub mod parser;
pub mod poly;
mod proptests;
pub mod queries;
pub mod session;
pub mod solver;

pub use config::{EngineConfig, SolverConfig};
pub use contract::{
    solve_with_timeout, LocalSolver, SolverBackend, SolverRequest, SolverResponse,
};
pub use error::{EngineError, ErrorKind, SyntaxError, GENERIC_FAILURE_MESSAGE};
pub use eval::{compile, sample, ChartData, Compiled, SampleSet};
pub use ir::{EquationDef, Expr};
pub use lifecycle::{transition, Effect, Entry, Event, LifecycleState, Phase};
pub use parser::{parse, parse_with_variable};
pub use poly::{normalize, normalize_with_limit, NormalForm};
pub use queries::Engine;
pub use session::{Session, View};
pub use solver::{solve, Factorization, Root, Solution};

/// Parse, normalize and solve `input` in `x` with default settings.
///
/// Supports implicit multiplication (`3x`, `(x - 1)(x + 1)`), integer exponents and
/// division by nonzero constants.
pub fn run(input: &str) -> Result<Solution, EngineError> {
    run_with_config(input, &EngineConfig::default())
}

/// Like [run], but with a custom variable name, degree limit and solver tolerance.
pub fn run_with_config(input: &str, config: &EngineConfig) -> Result<Solution, EngineError> {
    let expr = parse_with_variable(input, &config.variable)?;
    let normal = normalize_with_limit(&expr, config.max_degree)?;
    solve(&normal, &config.solver)
}
