//! In-memory ordered log of one open thread

use roomiex_store::{Message, MessageFilter};
use std::collections::HashSet;

use crate::thread::ThreadKey;

/// Messages of one thread, ascending by `(created_at, id)`, each id once.
///
/// Owned by exactly one session; never shared.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    viewer_id: String,
    filter: MessageFilter,
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new(viewer_id: &str, key: &ThreadKey) -> Self {
        Self {
            viewer_id: viewer_id.to_string(),
            filter: key.filter(viewer_id),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replace the contents with a fresh fetch
    pub fn replace_all(&mut self, fetched: Vec<Message>) {
        let mut seen = HashSet::new();
        let mut messages: Vec<Message> = fetched
            .into_iter()
            .filter(|m| self.filter.matches(m))
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        messages.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        self.messages = messages;
    }

    /// Merge one notified insert. Returns `false` for foreign or duplicate
    /// messages, which leave the log unchanged.
    pub fn insert(&mut self, message: Message) -> bool {
        if !self.filter.matches(&message) {
            return false;
        }
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            // A duplicate may carry a newer read flag
            existing.read |= message.read;
            return false;
        }

        let at = self
            .messages
            .partition_point(|m| (m.created_at, &m.id) <= (message.created_at, &message.id));
        self.messages.insert(at, message);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Message> {
        let pos = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(pos))
    }

    /// Flip `read` on those of `ids` addressed to the viewer. Never unsets it.
    pub fn mark_read(&mut self, ids: &[String]) -> usize {
        let mut changed = 0;
        for message in self.messages.iter_mut() {
            if !message.read
                && message.is_addressed_to(&self.viewer_id)
                && ids.iter().any(|id| *id == message.id)
            {
                message.read = true;
                changed += 1;
            }
        }
        changed
    }

    /// Ids of unread messages addressed to the viewer
    pub fn unread_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| !m.read && m.is_addressed_to(&self.viewer_id))
            .map(|m| m.id.clone())
            .collect()
    }
}
