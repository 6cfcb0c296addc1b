use polyroot_lang::{EngineConfig, EngineError, Engine, LocalSolver, SolverRequest};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

thread_local! {
    /// Settings used by every call on this thread (replaced by configure()).
    static CONFIG: RefCell<EngineConfig> = RefCell::new(EngineConfig::default());
}

fn with_config<R>(f: impl FnOnce(&EngineConfig) -> R) -> R {
    CONFIG.with(|c| f(&c.borrow()))
}

fn error_json(e: &EngineError) -> String {
    serde_json::json!({
        "error": e.user_message(),
        "kind": format!("{:?}", e.kind()),
    })
    .to_string()
}

/// Solve `input`; returns `{ roots, factorization }` (plus `identically_zero: true` for the
/// zero polynomial) or `{ error, kind }` as JSON.
#[wasm_bindgen]
pub fn solve(input: &str) -> String {
    let solver = LocalSolver::new(with_config(EngineConfig::clone));
    solver
        .respond(&SolverRequest::new(input))
        .and_then(|response| response.to_json())
        .unwrap_or_else(|e| error_json(&e))
}

/// Chart payload `{ labels, datasets: [{ data }] }` for `input`, or `{ error, kind }`.
#[wasm_bindgen]
pub fn curve(input: &str) -> String {
    let mut engine = Engine::new(with_config(EngineConfig::clone));
    match engine.samples("curve", input) {
        // serde_json writes non-finite samples as null, so a chart never fails to serialize.
        Ok(samples) => serde_json::to_string(&samples.to_chart()).unwrap_or_default(),
        Err(e) => error_json(&e),
    }
}

/// Replace the settings from a JSON object; absent fields take their defaults.
/// Returns an empty string on success, the error JSON otherwise.
#[wasm_bindgen]
pub fn configure(json: &str) -> String {
    match EngineConfig::from_json(json) {
        Ok(config) => {
            CONFIG.with(|c| *c.borrow_mut() = config);
            String::new()
        }
        Err(e) => error_json(&e),
    }
}
