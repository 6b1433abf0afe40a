//! Runtime configuration

use crate::state::DEFAULT_LANGUAGE;
use std::time::Duration;

const DEFAULT_SEARCH_DELAY_MS: u64 = 1000;
const DEFAULT_EVENT_CAPACITY: usize = 128;

/// Configuration for the tool host
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Simulated work per search in `run_searches`
    pub search_delay: Duration,
    /// Language new sessions start with
    pub default_language: String,
    /// Zone used by `current_time` when the caller gives none
    pub default_timezone: String,
    /// Broadcast buffer per session; slow observers skip older snapshots
    pub event_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            search_delay: Duration::from_millis(DEFAULT_SEARCH_DELAY_MS),
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_timezone: "UTC".to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let search_delay = lookup("PROVERBS_SEARCH_DELAY_MS")
            .and_then(|v| v.parse().ok())
            .map_or(defaults.search_delay, Duration::from_millis);

        let event_capacity = lookup("PROVERBS_EVENT_CAPACITY")
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.event_capacity);

        Self {
            search_delay,
            default_language: lookup("PROVERBS_DEFAULT_LANGUAGE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_language),
            default_timezone: lookup("PROVERBS_DEFAULT_TIMEZONE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_timezone),
            event_capacity,
        }
    }
}
