//! Thread keys

use roomiex_store::{Message, MessageFilter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one conversation from the viewer's side: who with, and
/// optionally which listing it is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThreadKey {
    pub counterpart_id: String,
    pub topic_id: Option<String>,
}

impl ThreadKey {
    pub fn direct(counterpart_id: impl Into<String>) -> Self {
        Self {
            counterpart_id: counterpart_id.into(),
            topic_id: None,
        }
    }

    pub fn room(counterpart_id: impl Into<String>, topic_id: impl Into<String>) -> Self {
        Self {
            counterpart_id: counterpart_id.into(),
            topic_id: Some(topic_id.into()),
        }
    }

    /// The thread `message` belongs to, seen by `viewer_id`
    pub fn for_message(message: &Message, viewer_id: &str) -> Self {
        Self {
            counterpart_id: message.counterpart_of(viewer_id).to_string(),
            topic_id: message.room_id.clone(),
        }
    }

    pub fn is_direct(&self) -> bool {
        self.topic_id.is_none()
    }

    pub fn filter(&self, viewer_id: &str) -> MessageFilter {
        MessageFilter::thread(viewer_id, &self.counterpart_id, self.topic_id.as_deref())
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.topic_id {
            Some(topic) => write!(f, "{}@{}", self.counterpart_id, topic),
            None => write!(f, "{}", self.counterpart_id),
        }
    }
}
