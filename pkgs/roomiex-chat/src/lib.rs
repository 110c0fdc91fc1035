//! RoomieX Chat - live conversation threads and the conversation list
//!
//! # Architecture
//!
//! - **ThreadKey**: counterpart plus optional listing topic; direct and
//!   room-scoped threads never mix
//! - **ConversationLog**: the ordered, duplicate-free message log of one
//!   thread, with the merge rules for feed notifications
//! - **ConversationSession**: a task owning one log; backfill, live updates,
//!   send, delete and read-state, closed on request or on sign-out
//! - **Inbox**: per-thread summaries recomputed from scratch on every change
//! - **MessageComposer**: draft text that survives failed sends
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roomiex_auth::AuthContext;
//! use roomiex_chat::{ConversationSession, SessionConfig, SessionEvent, ThreadKey};
//! use roomiex_store::MessageBackend;
//!
//! # async fn example(auth: AuthContext, backend: Arc<dyn MessageBackend>) -> roomiex_chat::Result<()> {
//! let key = ThreadKey::room("owner-id", "listing-id");
//! let (session, mut events) =
//!     ConversationSession::open(&auth, backend, key, &SessionConfig::default()).await?;
//!
//! session.send("Is the room still available?").await?;
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::Incoming(message) = event {
//!         println!("{}", message.content);
//!         break;
//!     }
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod buckets;
pub mod composer;
pub mod config;
pub mod error;
pub mod inbox;
pub mod log;
pub mod session;
pub mod thread;

pub use buckets::{bucket_for, clock_time, group_by_day, time_label, DayBucket, DayGroup};
pub use composer::MessageComposer;
pub use config::SessionConfig;
pub use error::{ChatError, Result};
pub use inbox::{
    summarize, ConversationSummary, Inbox, InboxView, DIRECT_MESSAGE_TITLE, UNKNOWN_ROOM,
    UNKNOWN_USER,
};
pub use log::ConversationLog;
pub use session::{CloseReason, ConversationSession, LoadStatus, SessionEvent, ThreadView};
pub use thread::ThreadKey;
