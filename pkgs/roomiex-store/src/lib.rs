//! RoomieX Store - collaborator layer for the RoomieX app
//!
//! The chat and listing crates talk to their backend only through the
//! capability traits in [`backend`]. This crate defines those traits and a
//! local implementation on SQLite (Sea-ORM) and the filesystem.
//!
//! # Architecture
//!
//! - **MessageStore**: message collection with query/insert/mark-read/delete
//!   and an in-process change feed ([`ChangeFeed`]) for inserts and deletes
//! - **ListingStore**: room listings published through the wizard
//! - **DbDirectory**: display names and listing titles for presentation
//! - **LocalObjectStorage**: photo uploads under a storage root
//! - **FlatmateManager**: profiles of people looking for a room
//! - **SavedRoomManager**, **BookingManager**, **ReviewManager**,
//!   **ProfileManager**: the remaining per-user tables
//!
//! # Database Schema
//!
//! - `accounts`: sign-in identities (owned by `roomiex-auth`)
//! - `profiles`: display name, avatar, phone
//! - `messages`: direct and room-scoped chat messages
//! - `room_listings`: listings with photos and AI analysis
//! - `flatmate_profiles`: budget, location, move-in date and lifestyle
//! - `saved_rooms`, `bookings`, `reviews`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use roomiex_store::{connect, MessageBackend, MessageStore, NewMessage, StoreConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::default();
//! let db = connect(&config).await?;
//! let store = MessageStore::new(db, config.feed_capacity);
//!
//! store
//!     .insert(NewMessage {
//!         sender_id: "alice".into(),
//!         receiver_id: "bob".into(),
//!         room_id: None,
//!         content: "Is the room still available?".into(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod booking_manager;
pub mod directory;
pub mod entities;
pub mod error;
pub mod feed;
pub mod flatmate_manager;
pub mod filter;
pub mod listing_store;
pub mod message_store;
pub mod migration;
pub mod object_storage;
pub mod profile_manager;
pub mod records;
pub mod review_manager;
pub mod saved_room_manager;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::path::PathBuf;
use tracing::info;

pub use backend::{Directory, ListingBackend, MessageBackend, ObjectStorage};
pub use booking_manager::{BookingManager, TIME_SLOTS};
pub use directory::DbDirectory;
pub use error::{Result, StoreError};
pub use feed::{ChangeEvent, ChangeFeed, FeedItem, Subscription};
pub use flatmate_manager::{FlatmateManager, AGE_RANGES, LIFESTYLE_OPTIONS, UNNAMED_FLATMATE};
pub use filter::MessageFilter;
pub use listing_store::{ListingStore, STATUS_PUBLISHED};
pub use message_store::MessageStore;
pub use object_storage::{object_key, LocalObjectStorage};
pub use profile_manager::ProfileManager;
pub use records::{
    rupees, Blob, Booking, BookingRequest, BookingStatus, BookingType, FlatmateDetails,
    FlatmateProfile, Message, NewListing, NewMessage, Profile, Review, RoomListing,
};
pub use review_manager::ReviewManager;
pub use saved_room_manager::SavedRoomManager;

/// Configuration for the local collaborator layer
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,

    /// Buffered change events per subscriber before it is told it lagged (default: 256)
    pub feed_capacity: usize,

    /// Prefix of the addresses returned for uploaded objects
    pub public_base_url: String,

    /// Directory uploaded objects are written to (default: `uploads/`)
    pub storage_root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("roomiex.db"),
            feed_capacity: 256,
            public_base_url: "file://uploads".to_string(),
            storage_root: PathBuf::from("uploads/"),
        }
    }
}

impl StoreConfig {
    pub fn database_url(&self) -> String {
        format!(
            "sqlite:{}?mode=rwc",
            self.db_path.to_string_lossy().replace('\\', "/")
        )
    }
}

/// Open the database and bring the schema up to date
pub async fn connect(config: &StoreConfig) -> Result<DatabaseConnection> {
    let db = Database::connect(config.database_url()).await?;
    migration::Migrator::up(&db, None).await?;
    info!("Store initialized at {}", config.db_path.display());
    Ok(db)
}
