//! Search tracking tools
//!
//! `add_search` records a pending query. `run_searches` completes pending
//! searches one at a time in append order, sleeping a fixed delay before
//! each completion to simulate work. The session lock is held across the
//! whole run, and each suspension point watches the cancellation token.
//! A cancelled run keeps whatever it already completed.

use super::{parse_input, Tool, ToolContext, ToolOutput};
use crate::state::AgentState;
use crate::sync::{snapshot, StateEvent};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Append a pending search and snapshot the result
pub fn add_search(state: &mut AgentState, query: impl Into<String>) -> StateEvent {
    let search = state.append_search(query);
    tracing::debug!(query = %search.query, "Search added");
    snapshot(state)
}

/// Outcome of a `run_searches` pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRun {
    /// Searches completed by this pass
    pub completed: usize,
    /// Searches still pending (non-zero only when cancelled)
    pub remaining: usize,
    pub cancelled: bool,
    /// Snapshot taken when the pass ended
    pub event: StateEvent,
}

/// Complete every pending search sequentially.
///
/// `on_progress` sees the state after each completion except the last;
/// the final state is carried by the returned `SearchRun::event`.
pub async fn run_searches<F>(
    state: &mut AgentState,
    delay: Duration,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> SearchRun
where
    F: FnMut(&AgentState) + Send,
{
    let pending = state.pending_searches();
    let total = pending.len();
    let mut completed = 0;

    for index in pending {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!(completed, remaining = total - completed, "Search run cancelled");
                return SearchRun {
                    completed,
                    remaining: total - completed,
                    cancelled: true,
                    event: snapshot(state),
                };
            }
            () = tokio::time::sleep(delay) => {}
        }

        state.complete_search(index);
        completed += 1;
        tracing::debug!(index, completed, total, "Search completed");
        if completed < total {
            on_progress(state);
        }
    }

    SearchRun {
        completed,
        remaining: 0,
        cancelled: false,
        event: snapshot(state),
    }
}

pub struct AddSearchTool;

#[derive(Debug, Deserialize)]
struct AddSearchInput {
    query: String,
}

#[async_trait]
impl Tool for AddSearchTool {
    fn name(&self) -> &'static str {
        "add_search"
    }

    fn description(&self) -> String {
        "Track a new search query. It stays pending until run_searches is called.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to track"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: AddSearchInput = match parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        let event = add_search(&mut *ctx.state().lock().await, input.query.clone());
        ToolOutput::success(format!("Added search \"{}\"", input.query)).with_event(event)
    }
}

pub struct RunSearchesTool;

#[async_trait]
impl Tool for RunSearchesTool {
    fn name(&self) -> &'static str {
        "run_searches"
    }

    fn description(&self) -> String {
        "Run all pending searches, one after another, marking each done as it finishes.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value, ctx: ToolContext) -> ToolOutput {
        let mut state = ctx.state().lock().await;
        let run = run_searches(&mut state, ctx.search_delay(), &ctx.cancel, |s| {
            ctx.emit(snapshot(s));
        })
        .await;

        let message = if run.cancelled {
            format!(
                "Cancelled after completing {} search(es); {} still pending",
                run.completed, run.remaining
            )
        } else {
            format!("Completed {} search(es)", run.completed)
        };
        ToolOutput::success(message).with_event(run.event)
    }
}
