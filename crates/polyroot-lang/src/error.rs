use thiserror::Error;

/// Message shown to the user for every failure that is only knowable after the solver round trip.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while processing the equation. Please check the format.";

/// Malformed expression text. `position` is a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at position {position}: {reason}")]
pub struct SyntaxError {
    pub position: usize,
    pub reason: String,
}

impl SyntaxError {
    pub fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while parsing, normalizing, solving or driving the result lifecycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Structurally not a polynomial (variable in a denominator or an exponent).
    #[error("not a polynomial: {0}")]
    NotPolynomial(String),

    /// Negative or non-integer exponent, division by a zero constant, degree over the limit.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("solver did not converge: {0}")]
    UnsolvableNumerically(String),

    /// Solver collaborator unreachable, timed out, or answered with a malformed payload.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("nothing to discard")]
    NothingToDiscard,
}

/// Coarse classification of [EngineError], for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    NotPolynomial,
    Domain,
    UnsolvableNumerically,
    Transport,
    Config,
    NothingToDiscard,
}

impl EngineError {
    pub fn syntax(position: usize, reason: impl Into<String>) -> Self {
        EngineError::Syntax(SyntaxError::new(position, reason))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Syntax(_) => ErrorKind::Syntax,
            EngineError::NotPolynomial(_) => ErrorKind::NotPolynomial,
            EngineError::Domain(_) => ErrorKind::Domain,
            EngineError::UnsolvableNumerically(_) => ErrorKind::UnsolvableNumerically,
            EngineError::Transport(_) => ErrorKind::Transport,
            EngineError::Config(_) => ErrorKind::Config,
            EngineError::NothingToDiscard => ErrorKind::NothingToDiscard,
        }
    }

    /// True for errors detected before any solver call is made.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            EngineError::Syntax(_) | EngineError::NotPolynomial(_) | EngineError::Domain(_)
        )
    }

    /// Text shown in the form. Solver-side failures all collapse to [GENERIC_FAILURE_MESSAGE].
    pub fn user_message(&self) -> String {
        match self {
            EngineError::UnsolvableNumerically(_) | EngineError::Transport(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}
