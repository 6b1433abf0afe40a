//! Proverb list tools
//!
//! Read, append, replace wholesale, and remove a single entry.

use super::{parse_input, Tool, ToolContext, ToolOutput};
use crate::error::ToolError;
use crate::state::AgentState;
use crate::sync::{snapshot, StateEvent};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Current proverbs, as an owned copy
pub fn get_proverbs(state: &AgentState) -> Vec<String> {
    state.proverbs.clone()
}

/// Append `items` and snapshot the result
pub fn add_proverbs(state: &mut AgentState, items: Vec<String>) -> StateEvent {
    state.append_proverbs(items);
    snapshot(state)
}

/// Replace the list with `items` and snapshot the result
pub fn set_proverbs(state: &mut AgentState, items: Vec<String>) -> StateEvent {
    state.replace_proverbs(items);
    snapshot(state)
}

/// Remove the proverb at `index` and snapshot the result
pub fn remove_proverb(state: &mut AgentState, index: usize) -> Result<StateEvent, ToolError> {
    let len = state.proverbs.len();
    state.remove_proverb(index).ok_or_else(|| {
        ToolError::invalid_input(format!(
            "index {index} is out of range for {len} proverb(s)"
        ))
    })?;
    Ok(snapshot(state))
}

fn proverbs_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "required": ["proverbs"],
        "properties": {
            "proverbs": {
                "type": "array",
                "items": {"type": "string"},
                "description": description
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct ProverbsInput {
    proverbs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RemoveInput {
    index: usize,
}

pub struct GetProverbsTool;

#[async_trait]
impl Tool for GetProverbsTool {
    fn name(&self) -> &'static str {
        "get_proverbs"
    }

    fn description(&self) -> String {
        "Get the current list of proverbs. Call this before mentioning, updating, or discussing proverbs.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value, ctx: ToolContext) -> ToolOutput {
        let proverbs = get_proverbs(&*ctx.state().lock().await);
        tracing::debug!(session_id = %ctx.session_id, count = proverbs.len(), "Getting proverbs");
        ToolOutput::success(format!("{} proverb(s)", proverbs.len())).with_data(json!(proverbs))
    }
}

pub struct AddProverbsTool;

#[async_trait]
impl Tool for AddProverbsTool {
    fn name(&self) -> &'static str {
        "add_proverbs"
    }

    fn description(&self) -> String {
        "Append proverbs to the end of the list. Existing proverbs are kept.".to_string()
    }

    fn input_schema(&self) -> Value {
        proverbs_schema("Proverbs to append, in order")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: ProverbsInput = match parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        let added = input.proverbs.len();
        let event = add_proverbs(&mut *ctx.state().lock().await, input.proverbs);
        ToolOutput::success(format!("Added {added} proverb(s)")).with_event(event)
    }
}

pub struct SetProverbsTool;

#[async_trait]
impl Tool for SetProverbsTool {
    fn name(&self) -> &'static str {
        "set_proverbs"
    }

    fn description(&self) -> String {
        "Replace the whole list of proverbs. Pass the complete list you want to keep; an empty list clears it.".to_string()
    }

    fn input_schema(&self) -> Value {
        proverbs_schema("The complete new list of proverbs")
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: ProverbsInput = match parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        let count = input.proverbs.len();
        let event = set_proverbs(&mut *ctx.state().lock().await, input.proverbs);
        ToolOutput::success(format!("Set {count} proverb(s)")).with_event(event)
    }
}

pub struct RemoveProverbTool;

#[async_trait]
impl Tool for RemoveProverbTool {
    fn name(&self) -> &'static str {
        "remove_proverb"
    }

    fn description(&self) -> String {
        "Remove a single proverb by its zero-based position in the list.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["index"],
            "properties": {
                "index": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Zero-based position of the proverb to remove"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: RemoveInput = match parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        match remove_proverb(&mut *ctx.state().lock().await, input.index) {
            Ok(event) => {
                ToolOutput::success(format!("Removed proverb {}", input.index)).with_event(event)
            }
            Err(e) => e.into(),
        }
    }
}
