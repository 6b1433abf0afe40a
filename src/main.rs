//! Proverbs agent - stdio tool host
//!
//! Speaks newline-delimited JSON-RPC on stdin/stdout. Logs go to stderr.

use proverbs_agent::bridge;
use proverbs_agent::{AgentConfig, SessionManager, ToolRegistry};
use std::sync::Arc;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proverbs_agent=info".into()),
        )
        .init();

    let config = AgentConfig::from_env();
    tracing::info!(
        search_delay_ms = %config.search_delay.as_millis(),
        language = %config.default_language,
        timezone = %config.default_timezone,
        "Starting proverbs agent"
    );

    let registry = ToolRegistry::standard();
    tracing::info!(
        tools = ?registry.definitions().iter().map(|d| d.name.clone()).collect::<Vec<_>>(),
        "Tool registry initialized"
    );

    let manager = Arc::new(SessionManager::new(config, registry));
    let stdin = BufReader::new(tokio::io::stdin());
    bridge::serve(manager, stdin, tokio::io::stdout()).await?;

    Ok(())
}
