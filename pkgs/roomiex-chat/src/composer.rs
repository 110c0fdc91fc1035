//! Draft text for the message input

use roomiex_store::Message;

use crate::error::Result;
use crate::session::ConversationSession;

/// Holds the input text. It is cleared only once a send succeeds, so a
/// failed send leaves the text in place for a retry.
#[derive(Debug, Default, Clone)]
pub struct MessageComposer {
    draft: String,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn can_send(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    pub async fn submit(&mut self, session: &ConversationSession) -> Result<Option<Message>> {
        if !self.can_send() {
            return Ok(None);
        }
        let sent = session.send(&self.draft).await?;
        if sent.is_some() {
            self.draft.clear();
        }
        Ok(sent)
    }
}
