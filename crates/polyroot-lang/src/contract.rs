//! Wire contract with the solver collaborator, and the async seam a backend plugs into.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::parser::parse_with_variable;
use crate::poly::normalize_with_limit;
use crate::solver::{self, Solution};
use futures::future::{self, Either, LocalBoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Factorization shown when the response omits one.
pub const MISSING_FACTORIZATION: &str = "N/A";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverRequest {
    pub polynomial: String,
}

impl SolverRequest {
    pub fn new(polynomial: impl Into<String>) -> Self {
        Self {
            polynomial: polynomial.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of one String field always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverResponse {
    #[serde(default)]
    pub roots: Vec<String>,
    #[serde(default = "missing_factorization")]
    pub factorization: String,
    /// Every value of the variable is a root. Absent on the wire unless set.
    #[serde(default, skip_serializing_if = "is_false")]
    pub identically_zero: bool,
}

fn missing_factorization() -> String {
    MISSING_FACTORIZATION.to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl SolverResponse {
    /// Display strings for a solved polynomial.
    pub fn from_solution(solution: &Solution, variable: &str) -> Self {
        Self {
            roots: solution.root_labels(),
            factorization: solution.factorization_label(variable),
            identically_zero: matches!(solution, Solution::IdenticallyZero),
        }
    }

    /// Decode a collaborator payload. Anything that is not a response object is a transport failure.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Transport(format!("malformed solver response: {e}")))
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::Transport(e.to_string()))
    }
}

/// Anything that can answer a [SolverRequest]: the in-process [LocalSolver], or a remote service.
pub trait SolverBackend {
    fn solve<'a>(
        &'a self,
        request: &'a SolverRequest,
    ) -> LocalBoxFuture<'a, Result<SolverResponse, EngineError>>;
}

/// Reference backend: parse, normalize and solve in-process.
#[derive(Clone, Debug, Default)]
pub struct LocalSolver {
    config: EngineConfig,
}

impl LocalSolver {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full structured result, for callers that want more than display strings.
    pub fn solution(&self, polynomial: &str) -> Result<Solution, EngineError> {
        let expr = parse_with_variable(polynomial, &self.config.variable)?;
        let normal = normalize_with_limit(&expr, self.config.max_degree)?;
        solver::solve(&normal, &self.config.solver)
    }

    pub fn respond(&self, request: &SolverRequest) -> Result<SolverResponse, EngineError> {
        let solution = self.solution(&request.polynomial)?;
        Ok(SolverResponse::from_solution(&solution, &self.config.variable))
    }
}

impl SolverBackend for LocalSolver {
    fn solve<'a>(
        &'a self,
        request: &'a SolverRequest,
    ) -> LocalBoxFuture<'a, Result<SolverResponse, EngineError>> {
        future::ready(self.respond(request)).boxed_local()
    }
}

/// Race a backend call against `timeout`. If the timeout finishes first the call is dropped
/// and the result is a transport failure.
pub async fn solve_with_timeout<B, T>(
    backend: &B,
    request: &SolverRequest,
    timeout: T,
) -> Result<SolverResponse, EngineError>
where
    B: SolverBackend + ?Sized,
    T: Future<Output = ()>,
{
    let call = backend.solve(request);
    let timeout = Box::pin(timeout);
    match future::select(call, timeout).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(((), _)) => {
            tracing::warn!(polynomial = %request.polynomial, "solver call timed out");
            Err(EngineError::Transport("timed out".to_string()))
        }
    }
}
