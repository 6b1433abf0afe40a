//! Session language tool

use super::{parse_input, Tool, ToolContext, ToolOutput};
use crate::error::ToolError;
use crate::state::AgentState;
use crate::sync::{snapshot, StateEvent};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Set the session language (stored lowercase) and snapshot the result
pub fn set_language(state: &mut AgentState, language: &str) -> Result<StateEvent, ToolError> {
    if language.trim().is_empty() {
        return Err(ToolError::invalid_input("language must not be blank"));
    }
    state.set_language(language);
    Ok(snapshot(state))
}

pub struct SetLanguageTool;

#[derive(Debug, Deserialize)]
struct LanguageInput {
    language: String,
}

#[async_trait]
impl Tool for SetLanguageTool {
    fn name(&self) -> &'static str {
        "set_language"
    }

    fn description(&self) -> String {
        "Set the language the proverbs are written in, e.g. \"english\" or \"spanish\".".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["language"],
            "properties": {
                "language": {
                    "type": "string",
                    "description": "Language name"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: LanguageInput = match parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };
        let mut state = ctx.state().lock().await;
        match set_language(&mut state, &input.language) {
            Ok(event) => {
                ToolOutput::success(format!("Language set to {}", state.language)).with_event(event)
            }
            Err(e) => e.into(),
        }
    }
}
