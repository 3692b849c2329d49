//! Session map: per-upload vector index plus append-only chat history.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. Sessions
//! are created on upload with a fresh UUID and live until process exit; there
//! is no eviction. History reads return a snapshot so no lock is held across
//! model calls; concurrent questions to the same session serialize on the
//! write lock and append in completion order.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::index::VectorIndex;
use crate::models::{ChatTurn, RetrievedChunk};

/// One user's isolated upload and conversation context.
pub struct Session {
    index: VectorIndex,
    history: Vec<ChatTurn>,
    created_at: DateTime<Utc>,
}

/// In-memory map of live sessions.
pub struct SessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new session around a freshly built index; returns its id.
    pub fn create(&self, index: VectorIndex) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut sessions = self.inner.write().unwrap();
        sessions.insert(
            session_id.clone(),
            Session {
                index,
                history: Vec::new(),
                created_at: Utc::now(),
            },
        );
        session_id
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Creation timestamp of a session.
    pub fn created_at(&self, session_id: &str) -> Result<DateTime<Utc>> {
        let sessions = self.inner.read().unwrap();
        match sessions.get(session_id) {
            Some(session) => Ok(session.created_at),
            None => bail!("session not found: {}", session_id),
        }
    }

    /// Snapshot of a session's chat history, oldest turn first.
    pub fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        let sessions = self.inner.read().unwrap();
        match sessions.get(session_id) {
            Some(session) => Ok(session.history.clone()),
            None => bail!("session not found: {}", session_id),
        }
    }

    /// Top-k similarity search against a session's index.
    pub fn search(
        &self,
        session_id: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let sessions = self.inner.read().unwrap();
        match sessions.get(session_id) {
            Some(session) => Ok(session.index.search(query, top_k)),
            None => bail!("session not found: {}", session_id),
        }
    }

    /// Append a completed turn. Turns are never mutated after append.
    pub fn append_turn(&self, session_id: &str, user: String, assistant: String) -> Result<()> {
        let mut sessions = self.inner.write().unwrap();
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.history.push(ChatTurn { user, assistant });
                Ok(())
            }
            None => bail!("session not found: {}", session_id),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn index_with_chunk(text: &str) -> VectorIndex {
        let mut index = VectorIndex::new(2);
        index
            .insert(
                Chunk {
                    id: "c0".to_string(),
                    document: "a.pdf".to_string(),
                    chunk_index: 0,
                    text: text.to_string(),
                    hash: String::new(),
                },
                vec![1.0, 0.0],
            )
            .unwrap();
        index
    }

    #[test]
    fn created_session_starts_with_empty_history() {
        let store = SessionStore::new();
        let id = store.create(index_with_chunk("hello"));
        assert_eq!(store.len(), 1);
        assert!(store.history(&id).unwrap().is_empty());
    }

    #[test]
    fn creation_timestamp_is_recorded() {
        let store = SessionStore::new();
        let before = Utc::now();
        let id = store.create(index_with_chunk("hello"));
        let created = store.created_at(&id).unwrap();
        assert!(created >= before);
        assert!(created <= Utc::now());
    }

    #[test]
    fn unknown_session_is_rejected() {
        let store = SessionStore::new();
        assert!(store.history("nope").unwrap_err().to_string().contains("not found"));
        assert!(store.created_at("nope").is_err());
        assert!(store.search("nope", &[1.0, 0.0], 4).is_err());
        assert!(store
            .append_turn("nope", "q".to_string(), "a".to_string())
            .is_err());
    }

    #[test]
    fn turns_append_in_order() {
        let store = SessionStore::new();
        let id = store.create(index_with_chunk("hello"));
        store
            .append_turn(&id, "first?".to_string(), "one.".to_string())
            .unwrap();
        store
            .append_turn(&id, "second?".to_string(), "two.".to_string())
            .unwrap();

        let history = store.history(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user, "first?");
        assert_eq!(history[0].assistant, "one.");
        assert_eq!(history[1].user, "second?");
    }

    #[test]
    fn search_hits_the_session_index() {
        let store = SessionStore::new();
        let id = store.create(index_with_chunk("needle"));
        let results = store.search(&id, &[1.0, 0.0], 4).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "needle");
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create(index_with_chunk("alpha"));
        let b = store.create(index_with_chunk("beta"));
        store
            .append_turn(&a, "q".to_string(), "a".to_string())
            .unwrap();

        assert_eq!(store.history(&a).unwrap().len(), 1);
        assert!(store.history(&b).unwrap().is_empty());
        assert_eq!(store.search(&b, &[1.0, 0.0], 4).unwrap()[0].text, "beta");
    }
}
