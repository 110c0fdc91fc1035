//! Error types for listings and room analysis

use roomiex_store::StoreError;
use thiserror::Error;

use crate::wizard::WizardStep;

pub type Result<T> = std::result::Result<T, ListingError>;

/// Errors from the room analysis service
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No analysis text in response")]
    EmptyResponse,

    #[error("Score {score} for {category} is outside 0-10")]
    InvalidScore { category: String, score: f64 },

    #[error("No API key configured for room analysis")]
    MissingApiKey,
}

/// Errors surfaced by the room directory and the listing wizard
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Step {0} is incomplete")]
    StepIncomplete(WizardStep),

    #[error("A listing takes at most {max} photos")]
    TooManyPhotos { max: usize },

    #[error("No photo to analyze")]
    NoPhotos,

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Backend error: {0}")]
    Backend(#[from] StoreError),
}
