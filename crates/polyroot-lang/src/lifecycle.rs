//! Result lifecycle as an explicit transition table.
//!
//! [transition] takes the current [LifecycleState] and one [Event] and returns the next
//! state plus the [Effect]s the caller must perform, in order. It never mutates anything
//! itself: History and Trash are only appended to by whoever executes the effects.

use crate::contract::{SolverRequest, SolverResponse};
use crate::error::EngineError;
use crate::eval::{ChartData, SampleSet};
use serde::{Deserialize, Serialize};

/// Snapshot recorded in History or Trash. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub equation: String,
    /// None when the snapshot was taken with no result displayed.
    pub roots: Option<Vec<String>>,
    pub factorization: Option<String>,
    #[serde(default)]
    pub identically_zero: bool,
}

/// The result currently on display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveResult {
    pub equation: String,
    pub roots: Vec<String>,
    pub factorization: String,
    /// Every value of the variable is a root, as opposed to no roots at all.
    pub identically_zero: bool,
}

impl ActiveResult {
    pub fn entry(&self) -> Entry {
        Entry {
            equation: self.equation.clone(),
            roots: Some(self.roots.clone()),
            factorization: Some(self.factorization.clone()),
            identically_zero: self.identically_zero,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    /// No result. `remembered` is the last equation typed into the form, if any.
    Idle { remembered: Option<String> },
    Active(ActiveResult),
}

/// Submission awaiting its solver response.
#[derive(Clone, Debug, PartialEq)]
pub struct Pending {
    pub ticket: u64,
    pub equation: String,
    pub samples: SampleSet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LifecycleState {
    pub phase: Phase,
    /// Only the newest submission is kept; older tickets resolve as stale.
    pub pending: Option<Pending>,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle { remembered: None },
            pending: None,
        }
    }
}

impl LifecycleState {
    pub fn active(&self) -> Option<&ActiveResult> {
        match &self.phase {
            Phase::Active(result) => Some(result),
            Phase::Idle { .. } => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The user submitted `equation`. `precheck` is the local parse, normalize and sample
    /// outcome; an error there means no solver call is made.
    Submit {
        ticket: u64,
        equation: String,
        precheck: Result<SampleSet, EngineError>,
    },
    /// The solver call for `ticket` finished.
    Resolved {
        ticket: u64,
        outcome: Result<SolverResponse, EngineError>,
    },
    Discard,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    CallSolver { ticket: u64, request: SolverRequest },
    AppendHistory(Entry),
    AppendTrash(Entry),
    ShowResult(ActiveResult),
    ShowChart(ChartData),
    /// Clear roots, factorization, chart and error.
    ClearResult,
    ClearEquation,
    SurfaceError(EngineError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: LifecycleState,
    pub effects: Vec<Effect>,
}

/// Apply one event. Fails only for a discard with nothing to discard.
pub fn transition(state: &LifecycleState, event: Event) -> Result<Transition, EngineError> {
    match event {
        Event::Submit {
            ticket,
            equation,
            precheck,
        } => Ok(submit(state, ticket, equation, precheck)),
        Event::Resolved { ticket, outcome } => Ok(resolve(state, ticket, outcome)),
        Event::Discard => discard(state),
    }
}

fn submit(
    state: &LifecycleState,
    ticket: u64,
    equation: String,
    precheck: Result<SampleSet, EngineError>,
) -> Transition {
    let phase = match &state.phase {
        Phase::Idle { .. } => Phase::Idle {
            remembered: Some(equation.clone()),
        },
        active @ Phase::Active(_) => active.clone(),
    };
    match precheck {
        Err(error) => Transition {
            state: LifecycleState {
                phase,
                pending: None,
            },
            effects: vec![Effect::ClearResult, Effect::SurfaceError(error)],
        },
        Ok(samples) => Transition {
            effects: vec![
                Effect::ClearResult,
                Effect::CallSolver {
                    ticket,
                    request: SolverRequest::new(equation.clone()),
                },
            ],
            state: LifecycleState {
                phase,
                pending: Some(Pending {
                    ticket,
                    equation,
                    samples,
                }),
            },
        },
    }
}

fn resolve(
    state: &LifecycleState,
    ticket: u64,
    outcome: Result<SolverResponse, EngineError>,
) -> Transition {
    let pending = match &state.pending {
        Some(p) if p.ticket == ticket => p,
        _ => {
            tracing::debug!(ticket, "ignoring stale solver response");
            return Transition {
                state: state.clone(),
                effects: Vec::new(),
            };
        }
    };
    match outcome {
        Ok(response) => {
            let result = ActiveResult {
                equation: pending.equation.clone(),
                roots: response.roots,
                factorization: response.factorization,
                identically_zero: response.identically_zero,
            };
            Transition {
                effects: vec![
                    Effect::AppendHistory(result.entry()),
                    Effect::ShowResult(result.clone()),
                    Effect::ShowChart(pending.samples.to_chart()),
                ],
                state: LifecycleState {
                    phase: Phase::Active(result),
                    pending: None,
                },
            }
        }
        Err(error) => Transition {
            state: LifecycleState {
                phase: state.phase.clone(),
                pending: None,
            },
            effects: vec![Effect::SurfaceError(error)],
        },
    }
}

fn discard(state: &LifecycleState) -> Result<Transition, EngineError> {
    let snapshot = match &state.phase {
        Phase::Active(result) => result.entry(),
        Phase::Idle {
            remembered: Some(equation),
        } => Entry {
            equation: equation.clone(),
            roots: None,
            factorization: None,
            identically_zero: false,
        },
        Phase::Idle { remembered: None } => return Err(EngineError::NothingToDiscard),
    };
    Ok(Transition {
        state: LifecycleState::default(),
        effects: vec![
            Effect::AppendTrash(snapshot),
            Effect::ClearResult,
            Effect::ClearEquation,
        ],
    })
}
