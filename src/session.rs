//! Session management
//!
//! Each session owns one `AgentState`, a broadcast channel for snapshot
//! events, and a cancellation token. Sessions share nothing with each
//! other; the manager only maps ids to sessions.

use crate::config::AgentConfig;
use crate::error::SessionError;
use crate::state::{AgentState, ClientState, SharedState};
use crate::sync::{event_stream, snapshot, StateEvent};
use crate::tools::{ToolContext, ToolDefinition, ToolOutput, ToolRegistry, ToolSettings};
use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// One conversation's state and event fan-out
pub struct Session {
    id: String,
    state: SharedState,
    broadcast_tx: broadcast::Sender<StateEvent>,
    cancel: CancellationToken,
}

impl Session {
    fn new(id: String, initial: AgentState, event_capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(event_capacity);
        Self {
            id,
            state: Arc::new(Mutex::new(initial)),
            broadcast_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Copy of the current state.
    ///
    /// Waits for any in-flight mutating tool to finish.
    pub async fn state(&self) -> AgentState {
        self.state.lock().await.clone()
    }

    /// Subscribe to snapshot events, starting with the current state
    pub async fn subscribe(&self) -> BoxStream<'static, StateEvent> {
        let rx = self.broadcast_tx.subscribe();
        let initial = snapshot(&*self.state.lock().await);
        event_stream(initial, rx).boxed()
    }

    fn publish(&self, event: StateEvent) {
        // No observers is fine
        let _ = self.broadcast_tx.send(event);
    }

    fn tool_context(&self, settings: Arc<ToolSettings>) -> ToolContext {
        ToolContext::new(
            self.cancel.child_token(),
            self.id.clone(),
            self.state.clone(),
            self.broadcast_tx.clone(),
            settings,
        )
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Manager for all live sessions
pub struct SessionManager {
    config: AgentConfig,
    registry: ToolRegistry,
    settings: Arc<ToolSettings>,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(config: AgentConfig, registry: ToolRegistry) -> Self {
        let settings = Arc::new(ToolSettings::from(&config));
        Self {
            config,
            registry,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session with default state
    pub async fn create(&self) -> Arc<Session> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(
            id.clone(),
            AgentState::with_language(&self.config.default_language),
            self.config.event_capacity,
        ));
        self.sessions.write().await.insert(id.clone(), session.clone());
        tracing::info!(session_id = %id, "Session created");
        session
    }

    pub async fn get(&self, session_id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Tear down a session, cancelling any in-flight tool.
    ///
    /// Returns `false` if the session did not exist.
    pub async fn close(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(session) => {
                session.cancel.cancel();
                tracing::info!(session_id = %session_id, "Session closed");
                true
            }
            None => false,
        }
    }

    /// Close every session
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        for (id, session) in drained {
            session.cancel.cancel();
            tracing::info!(session_id = %id, "Session closed");
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Run a tool against a session's state.
    ///
    /// A snapshot returned by the tool is broadcast to the session's
    /// observers before the output is handed back.
    pub async fn invoke(
        &self,
        session_id: &str,
        tool: &str,
        input: Value,
    ) -> Result<ToolOutput, SessionError> {
        let session = self.get(session_id).await?;
        if !self.registry.contains(tool) {
            return Err(SessionError::UnknownTool(tool.to_string()));
        }

        let ctx = session.tool_context(self.settings.clone());
        let output = self
            .registry
            .execute(tool, input, ctx)
            .await
            .ok_or_else(|| SessionError::UnknownTool(tool.to_string()))?;

        if output.success {
            tracing::info!(session_id = %session_id, tool, "Tool completed");
        } else {
            tracing::warn!(session_id = %session_id, tool, error = %output.output, "Tool failed");
        }

        if let Some(event) = &output.event {
            session.publish(event.clone());
        }
        Ok(output)
    }

    /// Adopt a state written back by the UI and broadcast the result
    pub async fn apply_client_state(
        &self,
        session_id: &str,
        client: ClientState,
    ) -> Result<StateEvent, SessionError> {
        let session = self.get(session_id).await?;
        let event = {
            let mut state = session.state.lock().await;
            state.adopt_client_state(client);
            snapshot(&state)
        };
        session.publish(event.clone());
        tracing::info!(session_id = %session_id, "Client state applied");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Search;
    use serde_json::json;
    use std::time::Duration;

    fn manager(search_delay: Duration) -> SessionManager {
        let config = AgentConfig {
            search_delay,
            ..AgentConfig::default()
        };
        SessionManager::new(config, ToolRegistry::standard())
    }

    #[tokio::test]
    async fn test_new_session_has_default_state() {
        let manager = manager(Duration::ZERO);
        let session = manager.create().await;
        assert_eq!(session.state().await, AgentState::default());
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_configured_language() {
        let config = AgentConfig {
            default_language: "Spanish".to_string(),
            ..AgentConfig::default()
        };
        let manager = SessionManager::new(config, ToolRegistry::standard());
        let session = manager.create().await;
        assert_eq!(session.state().await.language, "spanish");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = manager(Duration::ZERO);
        let a = manager.create().await;
        let b = manager.create().await;

        manager
            .invoke(a.id(), "add_proverbs", json!({"proverbs": ["only in a"]}))
            .await
            .unwrap();

        assert_eq!(a.state().await.proverbs, vec!["only in a"]);
        assert!(b.state().await.proverbs.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_unknown_session_and_tool() {
        let manager = manager(Duration::ZERO);
        let err = manager
            .invoke("missing", "get_proverbs", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NotFound("missing".to_string()));

        let session = manager.create().await;
        let err = manager
            .invoke(session.id(), "go_to_moon", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownTool("go_to_moon".to_string()));
    }

    #[tokio::test]
    async fn test_invoke_event_matches_state() {
        let manager = manager(Duration::ZERO);
        let session = manager.create().await;

        for (tool, input) in [
            ("set_proverbs", json!({"proverbs": ["a", "b"]})),
            ("add_proverbs", json!({"proverbs": ["c"]})),
            ("add_search", json!({"query": "weather today"})),
            ("run_searches", json!({})),
            ("set_language", json!({"language": "spanish"})),
        ] {
            let output = manager.invoke(session.id(), tool, input).await.unwrap();
            assert!(output.success, "{tool}: {}", output.output);
            assert_eq!(output.event.unwrap().state(), &session.state().await);
        }

        let output = manager
            .invoke(session.id(), "get_proverbs", json!({}))
            .await
            .unwrap();
        assert_eq!(output.data, Some(json!(["a", "b", "c"])));
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots() {
        let manager = manager(Duration::ZERO);
        let session = manager.create().await;
        let mut events = session.subscribe().await;

        let initial = events.next().await.unwrap();
        assert_eq!(initial.state(), &AgentState::default());

        manager
            .invoke(session.id(), "add_proverbs", json!({"proverbs": ["early bird"]}))
            .await
            .unwrap();
        let next = events.next().await.unwrap();
        assert_eq!(next.state().proverbs, vec!["early bird"]);
    }

    #[tokio::test]
    async fn test_close_cancels_running_searches() {
        let manager = Arc::new(manager(Duration::from_millis(50)));
        let session = manager.create().await;
        for q in ["a", "b", "c", "d"] {
            manager
                .invoke(session.id(), "add_search", json!({"query": q}))
                .await
                .unwrap();
        }

        let runner = {
            let manager = manager.clone();
            let id = session.id().to_string();
            tokio::spawn(async move { manager.invoke(&id, "run_searches", json!({})).await })
        };

        tokio::time::sleep(Duration::from_millis(110)).await;
        assert!(manager.close(session.id()).await);
        assert!(session.is_closed());

        let output = runner.await.unwrap().unwrap();
        assert!(output.success);
        assert!(output.output.starts_with("Cancelled"), "{}", output.output);

        let state = session.state().await;
        let done = state.searches.iter().filter(|s| s.done).count();
        assert!(done >= 1 && done < 4, "done = {done}");
        // Completed entries form a prefix
        assert!(state.searches.iter().skip(done).all(|s| !s.done));
        assert!(manager.get(session.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_tool_calls_serialize_per_session() {
        let manager = Arc::new(manager(Duration::from_millis(40)));
        let session = manager.create().await;
        manager
            .invoke(session.id(), "add_search", json!({"query": "slow"}))
            .await
            .unwrap();

        let runner = {
            let manager = manager.clone();
            let id = session.id().to_string();
            tokio::spawn(async move { manager.invoke(&id, "run_searches", json!({})).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Queued behind the run; sees the completed search
        let output = manager
            .invoke(session.id(), "add_search", json!({"query": "after"}))
            .await
            .unwrap();
        runner.await.unwrap().unwrap();

        assert_eq!(
            output.event.unwrap().state().searches,
            vec![
                Search {
                    query: "slow".to_string(),
                    done: true
                },
                Search::pending("after"),
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_client_state_broadcasts() {
        let manager = manager(Duration::ZERO);
        let session = manager.create().await;
        let mut events = session.subscribe().await;
        events.next().await;

        let client = ClientState {
            proverbs: Some(vec!["written by ui".to_string()]),
            language: Some("spanish".to_string()),
        };
        let event = manager
            .apply_client_state(session.id(), client)
            .await
            .unwrap();

        assert_eq!(events.next().await.unwrap(), event);
        assert_eq!(session.state().await.proverbs, vec!["written by ui"]);
    }

    #[tokio::test]
    async fn test_partial_client_state_keeps_configured_language() {
        let config = AgentConfig {
            default_language: "spanish".to_string(),
            ..AgentConfig::default()
        };
        let manager = SessionManager::new(config, ToolRegistry::standard());
        let session = manager.create().await;

        let client: ClientState = serde_json::from_value(json!({"proverbs": ["from ui"]})).unwrap();
        let event = manager
            .apply_client_state(session.id(), client)
            .await
            .unwrap();

        assert_eq!(event.state().proverbs, vec!["from ui"]);
        assert_eq!(event.state().language, "spanish");
        assert_eq!(session.state().await.language, "spanish");
    }

    #[tokio::test]
    async fn test_run_searches_publishes_final_snapshot_once() {
        let manager = manager(Duration::ZERO);
        let session = manager.create().await;
        manager
            .invoke(session.id(), "add_search", json!({"query": "only"}))
            .await
            .unwrap();
        let mut events = session.subscribe().await;
        events.next().await;

        manager
            .invoke(session.id(), "run_searches", json!({}))
            .await
            .unwrap();
        manager
            .invoke(session.id(), "add_proverbs", json!({"proverbs": ["marker"]}))
            .await
            .unwrap();

        let done = events.next().await.unwrap();
        assert!(done.state().searches[0].done);
        assert!(done.state().proverbs.is_empty());
        // Next event is the marker, not a repeat of the completed run
        let next = events.next().await.unwrap();
        assert_eq!(next.state().proverbs, vec!["marker"]);
    }

    #[tokio::test]
    async fn test_close_all() {
        let manager = manager(Duration::ZERO);
        manager.create().await;
        manager.create().await;
        manager.close_all().await;
        assert_eq!(manager.session_count().await, 0);
        assert!(!manager.close("anything").await);
    }
}
