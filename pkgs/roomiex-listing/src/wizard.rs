//! Listing creation wizard: Photos → Details → Pricing → AI Score → publish

use std::fmt;

use futures::future::try_join_all;
use roomiex_auth::AuthContext;
use roomiex_store::{Blob, ListingBackend, NewListing, ObjectStorage, RoomListing, STATUS_PUBLISHED};
use tracing::{debug, info, instrument, warn};

use crate::analysis::{RoomAnalysis, RoomAnalyzer};
use crate::error::{ListingError, Result};

pub const MAX_PHOTOS: usize = 6;

/// Folder photos are uploaded to
pub const PHOTO_FOLDER: &str = "rooms";

pub const AMENITIES: [&str; 9] = [
    "WiFi",
    "AC",
    "Furnished",
    "Parking",
    "Balcony",
    "Kitchen",
    "Washing Machine",
    "Gym",
    "Power Backup",
];

pub const MINIMUM_STAYS: [&str; 5] = ["No minimum", "1 month", "3 months", "6 months", "12 months"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    #[default]
    Photos,
    Details,
    Pricing,
    AiScore,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Photos,
        WizardStep::Details,
        WizardStep::Pricing,
        WizardStep::AiScore,
    ];

    /// 1-based position
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Photos => "Photos",
            WizardStep::Details => "Details",
            WizardStep::Pricing => "Pricing",
            WizardStep::AiScore => "AI Score",
        }
    }

    fn following(self) -> Option<WizardStep> {
        Self::ALL.get(self.number()).copied()
    }

    fn preceding(self) -> Option<WizardStep> {
        (self as usize).checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomType {
    #[default]
    PrivateRoom,
    SharedRoom,
    Pg,
    Studio,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::PrivateRoom,
        RoomType::SharedRoom,
        RoomType::Pg,
        RoomType::Studio,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RoomType::PrivateRoom => "Private Room",
            RoomType::SharedRoom => "Shared Room",
            RoomType::Pg => "PG",
            RoomType::Studio => "Studio",
        }
    }

    /// Value written to the listing record; studios are stored as private rooms
    pub fn stored_value(self) -> &'static str {
        match self {
            RoomType::PrivateRoom | RoomType::Studio => "private",
            RoomType::SharedRoom => "shared",
            RoomType::Pg => "pg",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Form fields of steps 2 and 3
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    /// Raw text as typed; see [`ListingWizard::price`]
    pub price: String,
    pub bills_included: bool,
    pub room_type: RoomType,
    pub available_from: Option<String>,
    pub minimum_stay: String,
    amenities: Vec<String>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            price: String::new(),
            bills_included: false,
            room_type: RoomType::default(),
            available_from: None,
            minimum_stay: MINIMUM_STAYS[0].to_string(),
            amenities: Vec::new(),
        }
    }
}

impl ListingDraft {
    pub fn amenities(&self) -> &[String] {
        &self.amenities
    }
}

/// State of one listing being created
#[derive(Debug, Clone, Default)]
pub struct ListingWizard {
    step: WizardStep,
    photos: Vec<Blob>,
    pub draft: ListingDraft,
    analysis: Option<RoomAnalysis>,
}

impl ListingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn photos(&self) -> &[Blob] {
        &self.photos
    }

    pub fn analysis(&self) -> Option<&RoomAnalysis> {
        self.analysis.as_ref()
    }

    pub fn ai_score(&self) -> Option<f64> {
        self.analysis.as_ref().map(|a| a.overall_score)
    }

    /// Append photos; a batch that would exceed [`MAX_PHOTOS`] is rejected whole
    pub fn add_photos(&mut self, photos: Vec<Blob>) -> Result<()> {
        if self.photos.len() + photos.len() > MAX_PHOTOS {
            return Err(ListingError::TooManyPhotos { max: MAX_PHOTOS });
        }
        self.photos.extend(photos);
        Ok(())
    }

    pub fn remove_photo(&mut self, index: usize) -> Option<Blob> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }

    /// Flip an amenity from [`AMENITIES`]. Returns whether it is now selected.
    pub fn toggle_amenity(&mut self, amenity: &str) -> bool {
        let Some(known) = AMENITIES.iter().find(|a| a.eq_ignore_ascii_case(amenity)) else {
            return false;
        };

        let amenities = &mut self.draft.amenities;
        if let Some(pos) = amenities.iter().position(|a| a == known) {
            amenities.remove(pos);
            false
        } else {
            amenities.push(known.to_string());
            true
        }
    }

    /// The typed price when it is a positive number
    pub fn price(&self) -> Option<f64> {
        self.draft
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn is_complete(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Photos => !self.photos.is_empty(),
            WizardStep::Details => {
                !self.draft.title.trim().is_empty() && !self.draft.location.trim().is_empty()
            }
            WizardStep::Pricing => self.price().is_some(),
            WizardStep::AiScore => self.ai_score().is_some(),
        }
    }

    /// Whether the current step is complete
    pub fn can_proceed(&self) -> bool {
        self.is_complete(self.step())
    }

    /// Advance one step. The last step has no successor and stays put.
    pub fn next(&mut self) -> Result<WizardStep> {
        let current = self.step();
        if !self.can_proceed() {
            return Err(ListingError::StepIncomplete(current));
        }
        let step = current.following().unwrap_or(current);
        self.step = step;
        debug!("Wizard at step {}", step);
        Ok(step)
    }

    pub fn back(&mut self) -> WizardStep {
        let step = self.step().preceding().unwrap_or(WizardStep::Photos);
        self.step = step;
        step
    }

    /// Score the first photo. A failed analysis keeps any earlier result.
    pub async fn analyze(&mut self, analyzer: &dyn RoomAnalyzer) -> Result<&RoomAnalysis> {
        let photo = self.photos.first().ok_or(ListingError::NoPhotos)?;
        let analysis = analyzer.analyze(photo).await?;
        info!(
            "Room scored {:.1}/10 ({})",
            analysis.overall_score,
            analysis.band()
        );
        Ok(self.analysis.insert(analysis))
    }

    pub fn can_publish(&self) -> bool {
        self.step() == WizardStep::AiScore
            && WizardStep::ALL.iter().all(|step| self.is_complete(*step))
    }

    /// Upload every photo, then insert the listing. Any failure aborts the
    /// publish and leaves the wizard as it was; photos uploaded before the
    /// failure stay in storage.
    #[instrument(skip_all, fields(photos = self.photos.len()))]
    pub async fn publish(
        &self,
        auth: &AuthContext,
        storage: &dyn ObjectStorage,
        listings: &dyn ListingBackend,
    ) -> Result<RoomListing> {
        let viewer = auth.current().ok_or(ListingError::NotSignedIn)?;
        if !self.can_publish() {
            let missing = WizardStep::ALL
                .into_iter()
                .find(|step| !self.is_complete(*step))
                .unwrap_or(WizardStep::AiScore);
            return Err(ListingError::StepIncomplete(missing));
        }
        let (Some(price), Some(analysis)) = (self.price(), self.analysis.as_ref()) else {
            return Err(ListingError::StepIncomplete(WizardStep::AiScore));
        };

        let photos = try_join_all(
            self.photos
                .iter()
                .map(|photo| storage.upload(photo, PHOTO_FOLDER)),
        )
        .await
        .inspect_err(|e| warn!("Photo upload failed: {}", e))?;

        let description = self.draft.description.trim();
        let listing = NewListing {
            owner_id: viewer.id,
            title: self.draft.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            location: self.draft.location.trim().to_string(),
            price,
            bills_included: self.draft.bills_included,
            room_type: self.draft.room_type.stored_value().to_string(),
            available_from: self
                .draft
                .available_from
                .clone()
                .filter(|d| !d.trim().is_empty()),
            minimum_stay: Some(self.draft.minimum_stay.clone()),
            amenities: self.draft.amenities.clone(),
            photos,
            ai_score: Some(analysis.overall_score),
            ai_analysis: Some(analysis.to_value()?),
            status: STATUS_PUBLISHED.to_string(),
        };

        let listing = listings
            .insert_listing(listing)
            .await
            .inspect_err(|e| warn!("Listing insert failed: {}", e))?;
        info!("Published listing {} ({})", listing.id, listing.title);
        Ok(listing)
    }
}
