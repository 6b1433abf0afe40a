//! State synchronization events
//!
//! Every mutating tool ends by snapshotting the full state. Observers
//! re-render from the latest snapshot, so a dropped event is harmless.

use crate::state::AgentState;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Events delivered to the UI observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateEvent {
    /// The observer's state is replaced by `snapshot`
    StateSnapshot { snapshot: AgentState },
}

impl StateEvent {
    /// The state carried by this event
    pub fn state(&self) -> &AgentState {
        match self {
            StateEvent::StateSnapshot { snapshot } => snapshot,
        }
    }
}

/// Wrap an owned copy of `state` in a snapshot event
pub fn snapshot(state: &AgentState) -> StateEvent {
    StateEvent::StateSnapshot {
        snapshot: state.clone(),
    }
}

/// Stream that yields `initial` and then every broadcast event.
///
/// Lagged receivers skip ahead; the next snapshot supersedes whatever
/// was missed.
pub fn event_stream(
    initial: StateEvent,
    broadcast_rx: broadcast::Receiver<StateEvent>,
) -> impl Stream<Item = StateEvent> {
    let init = stream::once(async move { initial });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| async move {
        match result {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(error = %e, "Observer lagged, skipping to next snapshot");
                None
            }
        }
    });

    init.chain(broadcasts)
}
