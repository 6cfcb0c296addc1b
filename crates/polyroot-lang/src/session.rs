//! Session: drives the lifecycle table and executes its effects.
//!
//! Owns the display view model, the History and Trash logs and the query [Engine]. A
//! submission is split into [Session::begin_submit] (local checks, solver request) and
//! [Session::resolve] (solver outcome), so a caller with its own event loop can interleave
//! submissions; [Session::submit] runs both around one backend call.

use crate::config::EngineConfig;
use crate::contract::{solve_with_timeout, SolverBackend, SolverRequest, SolverResponse};
use crate::error::EngineError;
use crate::eval::ChartData;
use crate::lifecycle::{transition, Effect, Entry, Event, LifecycleState, Transition};
use crate::queries::Engine;
use std::future::Future;

/// Engine slot holding the form's equation.
const FORM_SLOT: &str = "form";

/// What the form currently shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct View {
    pub equation: String,
    pub roots: Option<Vec<String>>,
    pub factorization: Option<String>,
    /// Every value of the variable is a root (`roots` is then empty).
    pub identically_zero: bool,
    pub chart: Option<ChartData>,
    /// User-facing message of the last surfaced error.
    pub error: Option<String>,
}

pub type Sink = Box<dyn FnMut(&Entry)>;

pub struct Session {
    state: LifecycleState,
    view: View,
    history: Vec<Entry>,
    trash: Vec<Entry>,
    last_error: Option<EngineError>,
    engine: Engine,
    next_ticket: u64,
    history_sink: Option<Sink>,
    trash_sink: Option<Sink>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: LifecycleState::default(),
            view: View::default(),
            history: Vec::new(),
            trash: Vec::new(),
            last_error: None,
            engine: Engine::new(config),
            next_ticket: 1,
            history_sink: None,
            trash_sink: None,
        }
    }

    /// Called once per History append.
    pub fn on_history(&mut self, sink: impl FnMut(&Entry) + 'static) {
        self.history_sink = Some(Box::new(sink));
    }

    /// Called once per Trash append.
    pub fn on_trash(&mut self, sink: impl FnMut(&Entry) + 'static) {
        self.trash_sink = Some(Box::new(sink));
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn history(&self) -> &[Entry] {
        &self.history
    }

    pub fn trash(&self) -> &[Entry] {
        &self.trash
    }

    /// The last surfaced error, with its kind intact.
    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Start a submission. Returns the ticket and request to send when the local checks pass.
    pub fn begin_submit(&mut self, text: &str) -> Option<(u64, SolverRequest)> {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.view.equation = text.to_string();
        let precheck = self.engine.samples(FORM_SLOT, text);
        tracing::debug!(ticket, equation = text, local_ok = precheck.is_ok(), "submit");
        let event = Event::Submit {
            ticket,
            equation: text.to_string(),
            precheck,
        };
        match transition(&self.state, event) {
            Ok(t) => self.apply(t),
            Err(error) => {
                self.surface(error);
                None
            }
        }
    }

    /// Feed back the outcome of the solver call for `ticket`.
    pub fn resolve(&mut self, ticket: u64, outcome: Result<SolverResponse, EngineError>) {
        match transition(&self.state, Event::Resolved { ticket, outcome }) {
            Ok(t) => {
                self.apply(t);
            }
            Err(error) => self.surface(error),
        }
    }

    /// Submit and wait for the backend. Returns the surfaced error, if any.
    pub async fn submit<B>(&mut self, backend: &B, text: &str) -> Result<(), EngineError>
    where
        B: SolverBackend + ?Sized,
    {
        self.submit_with_timeout(backend, text, futures::future::pending())
            .await
    }

    /// Like [Session::submit], but the solver call is abandoned when `timeout` completes.
    pub async fn submit_with_timeout<B, T>(
        &mut self,
        backend: &B,
        text: &str,
        timeout: T,
    ) -> Result<(), EngineError>
    where
        B: SolverBackend + ?Sized,
        T: Future<Output = ()>,
    {
        self.last_error = None;
        if let Some((ticket, request)) = self.begin_submit(text) {
            let outcome = solve_with_timeout(backend, &request, timeout).await;
            self.resolve(ticket, outcome);
        }
        match &self.last_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Move the current result (or remembered equation) to Trash and clear the form.
    pub fn discard(&mut self) -> Result<(), EngineError> {
        let t = transition(&self.state, Event::Discard)?;
        self.apply(t);
        Ok(())
    }

    fn apply(&mut self, t: Transition) -> Option<(u64, SolverRequest)> {
        self.state = t.state;
        let mut call = None;
        for effect in t.effects {
            match effect {
                Effect::CallSolver { ticket, request } => call = Some((ticket, request)),
                Effect::AppendHistory(entry) => {
                    tracing::info!(equation = %entry.equation, "history");
                    if let Some(sink) = self.history_sink.as_mut() {
                        sink(&entry);
                    }
                    self.history.push(entry);
                }
                Effect::AppendTrash(entry) => {
                    tracing::info!(equation = %entry.equation, "trash");
                    if let Some(sink) = self.trash_sink.as_mut() {
                        sink(&entry);
                    }
                    self.trash.push(entry);
                }
                Effect::ShowResult(result) => {
                    self.view.roots = Some(result.roots);
                    self.view.factorization = Some(result.factorization);
                    self.view.identically_zero = result.identically_zero;
                }
                Effect::ShowChart(chart) => self.view.chart = Some(chart),
                Effect::ClearResult => {
                    self.view.roots = None;
                    self.view.factorization = None;
                    self.view.identically_zero = false;
                    self.view.chart = None;
                    self.view.error = None;
                    self.last_error = None;
                }
                Effect::ClearEquation => self.view.equation.clear(),
                Effect::SurfaceError(error) => self.surface(error),
            }
        }
        call
    }

    fn surface(&mut self, error: EngineError) {
        tracing::warn!(kind = ?error.kind(), %error, "surfacing error");
        self.view.error = Some(error.user_message());
        self.last_error = Some(error);
    }
}
