//! The list of chat sessions shown in the sidebar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_SESSION_ID: &str = "default";
const DEFAULT_TITLE: &str = "Default Chat";
const NEW_TITLE: &str = "New Chat";
const DEFAULT_MESSAGE: &str = "Start designing your Azure architecture";
const NEW_MESSAGE: &str = "Start a new architecture design";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub last_message: String,
    pub updated_at: DateTime<Utc>,
}

impl SessionSummary {
    fn new(id: impl Into<String>, title: &str, last_message: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            last_message: last_message.to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// Newest first. The default session is always present.
#[derive(Debug, Clone)]
pub struct SessionList {
    sessions: Vec<SessionSummary>,
}

impl Default for SessionList {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionList {
    pub fn new() -> Self {
        Self {
            sessions: vec![SessionSummary::new(
                DEFAULT_SESSION_ID,
                DEFAULT_TITLE,
                DEFAULT_MESSAGE,
            )],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionSummary> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SessionSummary> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Add a fresh "New Chat" session at the top and return its id.
    pub fn create(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .insert(0, SessionSummary::new(id.clone(), NEW_TITLE, NEW_MESSAGE));
        id
    }

    /// Register `id` if it is not listed yet.
    pub fn ensure(&mut self, id: &str) {
        if !self.contains(id) {
            self.sessions.insert(0, SessionSummary::new(id, NEW_TITLE, NEW_MESSAGE));
        }
    }

    /// The default session is never removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if id == DEFAULT_SESSION_ID {
            return false;
        }
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    pub fn record_message(&mut self, id: &str, message: &str) {
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) {
            session.last_message = message.to_string();
            session.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_protected_default() {
        let mut list = SessionList::new();
        assert_eq!(list.len(), 1);
        assert!(!list.remove(DEFAULT_SESSION_ID));
        assert!(list.contains(DEFAULT_SESSION_ID));
    }

    #[test]
    fn created_sessions_go_first_with_new_chat_title() {
        let mut list = SessionList::new();
        let id = list.create();
        let first = list.iter().next().unwrap();
        assert_eq!(first.id, id);
        assert_eq!(first.title, "New Chat");
        assert!(list.remove(&id));
        assert!(!list.remove(&id));
    }

    #[test]
    fn ensure_and_record_message() {
        let mut list = SessionList::new();
        list.ensure("b");
        list.ensure("b");
        assert_eq!(list.len(), 2);
        list.record_message("b", "three tier web app");
        assert_eq!(list.get("b").unwrap().last_message, "three tier web app");
    }
}
