//! Proverbs agent - session-scoped tool host
//!
//! Holds per-session agent state, exposes typed tools that read and mutate
//! it, and keeps UI observers in sync by emitting full-state snapshot
//! events after every mutation.

pub mod bridge;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod sync;
pub mod tools;

pub use config::AgentConfig;
pub use error::{BridgeError, SessionError, ToolError};
pub use session::{Session, SessionManager};
pub use state::{AgentState, ClientState, Search};
pub use sync::{snapshot, StateEvent};
pub use tools::{ToolDefinition, ToolOutput, ToolRegistry};
