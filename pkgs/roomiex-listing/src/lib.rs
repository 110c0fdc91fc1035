//! RoomieX Listing - rooms, the listing wizard and AI photo scoring
//!
//! # Architecture
//!
//! - **Room**: a showcase fixture or a live listing, classified once by
//!   [`RoomDirectory::resolve`]
//! - **RoomDirectory**: id resolution, browse filtering, owner names
//! - **ListingWizard**: the four-step creation flow and its publish pipeline
//!   (upload photos, then insert the listing)
//! - **RoomAnalyzer**: photo quality scoring; [`GeminiAnalyzer`] calls the
//!   Gemini `generateContent` endpoint
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use roomiex_auth::AuthContext;
//! use roomiex_listing::{GeminiAnalyzer, ListingWizard};
//! use roomiex_store::{Blob, ListingStore, LocalObjectStorage};
//!
//! # async fn example(
//! #     auth: AuthContext,
//! #     storage: LocalObjectStorage,
//! #     listings: ListingStore,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let mut wizard = ListingWizard::new();
//! wizard.add_photos(vec![Blob::from_path("room.jpg".as_ref()).await?])?;
//! wizard.next()?;
//!
//! wizard.draft.title = "Bright room near the metro".into();
//! wizard.draft.location = "Koramangala, Bangalore".into();
//! wizard.next()?;
//!
//! wizard.draft.price = "12000".into();
//! wizard.next()?;
//!
//! wizard.analyze(&GeminiAnalyzer::new("api-key")).await?;
//! let listing = wizard.publish(&auth, &storage, &listings).await?;
//! println!("Published {}", listing.id);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod error;
pub mod gemini;
pub mod room;
pub mod wizard;

pub use analysis::{
    parse_analysis_text, parse_response, CategoryScore, RoomAnalysis, RoomAnalyzer, ScoreBand,
    ANALYSIS_PROMPT,
};
pub use error::{AnalysisError, ListingError, Result};
pub use gemini::{GeminiAnalyzer, GeminiConfig};
pub use room::{demo_room, BrowseFilter, DemoRoom, Room, RoomDirectory, DEMO_ROOMS};
pub use wizard::{
    ListingDraft, ListingWizard, RoomType, WizardStep, AMENITIES, MAX_PHOTOS, MINIMUM_STAYS,
    PHOTO_FOLDER,
};
