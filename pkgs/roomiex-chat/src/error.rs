//! Error types for conversation sessions

use roomiex_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors surfaced by sessions and the inbox.
///
/// Collaborator failures are not classified further: a rejected delete and a
/// dropped connection both arrive as `Backend`.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Cannot open a conversation with yourself")]
    SelfConversation,
    #[error("Backend error: {0}")]
    Backend(#[from] StoreError),
    #[error("Session is closed")]
    Closed,
}
