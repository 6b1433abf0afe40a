//! Per-session agent state
//!
//! One `AgentState` lives for the duration of a session. Tools mutate it in
//! place; "set" operations replace a collection wholesale.

#[cfg(test)]
mod proptests;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Language tag a fresh session starts with
pub const DEFAULT_LANGUAGE: &str = "english";

/// Session-exclusive handle to the state.
///
/// Mutating tools hold the lock for their whole run, so a session never
/// sees two mutations interleave.
pub type SharedState = Arc<Mutex<AgentState>>;

/// A tracked query with a pending/done completion flag.
///
/// `done` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    pub query: String,
    #[serde(default)]
    pub done: bool,
}

impl Search {
    pub fn pending(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            done: false,
        }
    }
}

/// Shared state between the agent and its UI observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentState {
    /// Proverbs in insertion order, duplicates allowed
    pub proverbs: Vec<String>,
    /// Searches in append order; entries are never removed
    pub searches: Vec<Search>,
    /// Lowercase language tag
    pub language: String,
}

/// State written back by the UI.
///
/// Only the fields the client actually sent are present. Any `searches`
/// the client echoes back are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientState {
    #[serde(default)]
    pub proverbs: Option<Vec<String>>,
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for AgentState {
    fn default() -> Self {
        Self::with_language(DEFAULT_LANGUAGE)
    }
}

impl AgentState {
    /// Empty state with the given initial language
    pub fn with_language(language: &str) -> Self {
        Self {
            proverbs: Vec::new(),
            searches: Vec::new(),
            language: normalize_language(language),
        }
    }

    /// Append each proverb to the end of the list, keeping order
    pub fn append_proverbs<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.proverbs.extend(items);
    }

    /// Discard the current list and use `items` verbatim
    pub fn replace_proverbs(&mut self, items: Vec<String>) {
        self.proverbs = items;
    }

    /// Remove the proverb at `index`, if there is one
    pub fn remove_proverb(&mut self, index: usize) -> Option<String> {
        (index < self.proverbs.len()).then(|| self.proverbs.remove(index))
    }

    /// Append a new pending search and return a copy of it
    pub fn append_search(&mut self, query: impl Into<String>) -> Search {
        let search = Search::pending(query);
        self.searches.push(search.clone());
        search
    }

    /// Indices of searches still pending, in append order
    pub fn pending_searches(&self) -> Vec<usize> {
        self.searches
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.done)
            .map(|(i, _)| i)
            .collect()
    }

    /// Mark one search done. Returns `true` only if it was pending.
    pub fn complete_search(&mut self, index: usize) -> bool {
        match self.searches.get_mut(index) {
            Some(search) if !search.done => {
                search.done = true;
                true
            }
            _ => false,
        }
    }

    /// Mark every pending search done, in order. Idempotent.
    pub fn complete_all_searches(&mut self) -> usize {
        let mut completed = 0;
        for search in self.searches.iter_mut().filter(|s| !s.done) {
            search.done = true;
            completed += 1;
        }
        completed
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = normalize_language(language);
    }

    /// Apply a state written back by the UI.
    ///
    /// Fields the client left out keep their current value; a blank
    /// language is ignored. Searches stay server-owned: the client can
    /// neither drop entries nor revert a completed one.
    pub fn adopt_client_state(&mut self, client: ClientState) {
        if let Some(proverbs) = client.proverbs {
            self.proverbs = proverbs;
        }
        if let Some(language) = client.language.filter(|l| !l.trim().is_empty()) {
            self.set_language(&language);
        }
    }
}

fn normalize_language(language: &str) -> String {
    language.trim().to_lowercase()
}
