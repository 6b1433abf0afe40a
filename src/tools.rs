//! Tools exposed to the agent runtime
//!
//! Tools are stateless singletons. Everything a call needs, including the
//! session's state, arrives through `ToolContext`.

mod language;
mod proverbs;
mod searches;
mod time;
mod weather;

pub use language::{set_language, SetLanguageTool};
pub use proverbs::{
    add_proverbs, get_proverbs, remove_proverb, set_proverbs, AddProverbsTool, GetProverbsTool,
    RemoveProverbTool, SetProverbsTool,
};
pub use searches::{add_search, run_searches, AddSearchTool, RunSearchesTool, SearchRun};
pub use time::{current_time, CurrentTimeTool};
pub use weather::{get_weather, GetWeatherTool};

use crate::config::AgentConfig;
use crate::error::ToolError;
use crate::state::SharedState;
use crate::sync::StateEvent;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
    /// Structured result for read-only tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Snapshot emitted by mutating tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<StateEvent>,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
            event: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
            data: None,
            event: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_event(mut self, event: StateEvent) -> Self {
        self.event = Some(event);
        self
    }
}

impl From<ToolError> for ToolOutput {
    fn from(err: ToolError) -> Self {
        ToolOutput::error(err.to_string())
    }
}

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Per-host tool settings
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub search_delay: Duration,
    pub default_timezone: String,
}

impl From<&AgentConfig> for ToolSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            search_delay: config.search_delay,
            default_timezone: config.default_timezone.clone(),
        }
    }
}

/// All context needed for a tool invocation.
///
/// Created fresh for each tool call by the session that owns the state.
#[derive(Clone)]
pub struct ToolContext {
    /// Cancellation signal, fired when the session is torn down
    pub cancel: CancellationToken,

    /// The session this tool is executing within
    pub session_id: String,

    state: SharedState,
    events: broadcast::Sender<StateEvent>,
    settings: Arc<ToolSettings>,
}

impl ToolContext {
    pub fn new(
        cancel: CancellationToken,
        session_id: String,
        state: SharedState,
        events: broadcast::Sender<StateEvent>,
        settings: Arc<ToolSettings>,
    ) -> Self {
        Self {
            cancel,
            session_id,
            state,
            events,
            settings,
        }
    }

    /// The session's state
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Publish an intermediate event to the session's observers.
    ///
    /// Having no observers is not an error.
    pub fn emit(&self, event: StateEvent) {
        let _ = self.events.send(event);
    }

    pub fn search_delay(&self) -> Duration {
        self.settings.search_delay
    }

    pub fn default_timezone(&self) -> &str {
        &self.settings.default_timezone
    }
}

/// Trait for tools that can be executed by the agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool with all context provided via `ToolContext`
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// Deserialize tool arguments, treating `null` as an empty object
pub(crate) fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, ToolError> {
    let input = if input.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        input
    };
    serde_json::from_value(input).map_err(|e| ToolError::invalid_input(e.to_string()))
}

/// Collection of tools available to sessions
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create the standard tool set
    pub fn standard() -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(GetProverbsTool),
            Arc::new(AddProverbsTool),
            Arc::new(SetProverbsTool),
            Arc::new(RemoveProverbTool),
            Arc::new(GetWeatherTool),
            Arc::new(CurrentTimeTool),
            Arc::new(AddSearchTool),
            Arc::new(RunSearchesTool),
            Arc::new(SetLanguageTool),
        ];
        Self { tools }
    }

    /// Get all tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Execute a tool by name with context
    pub async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        for tool in &self.tools {
            if tool.name() == name {
                return Some(tool.run(input, ctx).await);
            }
        }
        None
    }
}
