//! Capability interfaces consumed by the chat and listing layers.
//!
//! The SQLite implementations live in this crate; a hosted backend would
//! implement the same traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::Subscription;
use crate::filter::MessageFilter;
use crate::records::{Blob, Message, NewListing, NewMessage, RoomListing};

#[async_trait]
pub trait MessageBackend: Send + Sync {
    /// Messages matching `filter`, ascending by creation time (id breaks ties)
    async fn query(&self, filter: &MessageFilter) -> Result<Vec<Message>>;

    /// Store a message; the backend assigns id and timestamp
    async fn insert(&self, message: NewMessage) -> Result<Message>;

    /// Set `read = true` on those of `ids` addressed to `receiver_id`.
    /// Returns the number of rows that changed.
    async fn mark_read(&self, receiver_id: &str, ids: &[String]) -> Result<u64>;

    /// Remove a message. Only its sender may do so; an absent id is a no-op.
    async fn delete(&self, requester_id: &str, message_id: &str) -> Result<()>;

    fn subscribe(&self, filter: MessageFilter) -> Subscription;
}

#[async_trait]
pub trait ListingBackend: Send + Sync {
    async fn insert_listing(&self, listing: NewListing) -> Result<RoomListing>;

    async fn get_listing(&self, id: &str) -> Result<Option<RoomListing>>;

    /// Published listings, newest first
    async fn published_listings(&self) -> Result<Vec<RoomListing>>;

    async fn listings_by_owner(&self, owner_id: &str) -> Result<Vec<RoomListing>>;
}

/// Supplementary lookups used for display only
#[async_trait]
pub trait Directory: Send + Sync {
    async fn display_name(&self, user_id: &str) -> Result<Option<String>>;

    async fn listing_title(&self, room_id: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `blob` under `folder` and return its public address
    async fn upload(&self, blob: &Blob, folder: &str) -> Result<String>;
}
