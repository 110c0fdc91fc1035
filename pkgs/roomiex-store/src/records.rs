//! Domain records exchanged with the collaborator layer

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::entities::{bookings, flatmate_profiles, messages, profiles, reviews, room_listings};
use crate::error::{Result, StoreError};

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

/// A chat message as stored by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Listing the message is scoped to; `None` for direct messages
    pub room_id: Option<String>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether `user_id` is the sender or the receiver
    pub fn involves(&self, user_id: &str) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }

    pub fn is_addressed_to(&self, user_id: &str) -> bool {
        self.receiver_id == user_id
    }

    /// The other participant, seen from `user_id`
    pub fn counterpart_of(&self, user_id: &str) -> &str {
        if self.sender_id == user_id {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

impl From<messages::Model> for Message {
    fn from(model: messages::Model) -> Self {
        Self {
            id: model.id,
            sender_id: model.sender_id,
            receiver_id: model.receiver_id,
            room_id: model.room_id,
            content: model.content,
            read: model.read,
            created_at: from_millis(model.created_at),
        }
    }
}

/// Fields supplied by the sender; id and timestamp are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub room_id: Option<String>,
    pub content: String,
}

/// A room listing created through the listing wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListing {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub price: f64,
    pub bills_included: bool,
    pub room_type: String,
    pub available_from: Option<String>,
    pub minimum_stay: Option<String>,
    pub amenities: Vec<String>,
    pub photos: Vec<String>,
    pub ai_score: Option<f64>,
    pub ai_analysis: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<room_listings::Model> for RoomListing {
    type Error = StoreError;

    fn try_from(model: room_listings::Model) -> Result<Self> {
        let ai_analysis = model
            .ai_analysis_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Self {
            id: model.id,
            owner_id: model.user_id,
            title: model.title,
            description: model.description,
            location: model.location,
            price: model.price,
            bills_included: model.bills_included,
            room_type: model.room_type,
            available_from: model.available_from,
            minimum_stay: model.minimum_stay,
            amenities: serde_json::from_str(&model.amenities_json)?,
            photos: serde_json::from_str(&model.photos_json)?,
            ai_score: model.ai_score,
            ai_analysis,
            status: model.status,
            created_at: from_millis(model.created_at),
        })
    }
}

/// Listing fields collected before insert
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewListing {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub price: f64,
    pub bills_included: bool,
    pub room_type: String,
    pub available_from: Option<String>,
    pub minimum_stay: Option<String>,
    pub amenities: Vec<String>,
    pub photos: Vec<String>,
    pub ai_score: Option<f64>,
    pub ai_analysis: Option<serde_json::Value>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Viewing,
    TrialStay,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Viewing => "viewing",
            BookingType::TrialStay => "trial_stay",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "viewing" => Some(BookingType::Viewing),
            "trial_stay" => Some(BookingType::TrialStay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// A viewing or trial-stay request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub id: String,
    pub room_id: String,
    pub requester_id: String,
    pub owner_id: String,
    pub booking_type: BookingType,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub message: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    /// Set when listed for a viewer who owns the room
    pub is_owner: bool,
}

impl Booking {
    pub(crate) fn from_model(model: bookings::Model, viewer_id: &str) -> Result<Self> {
        let booking_type = BookingType::parse(&model.booking_type).ok_or_else(|| {
            StoreError::Invalid(format!("booking type {}", model.booking_type))
        })?;
        let status = BookingStatus::parse(&model.status)
            .ok_or_else(|| StoreError::Invalid(format!("booking status {}", model.status)))?;
        let preferred_date = NaiveDate::parse_from_str(&model.preferred_date, "%Y-%m-%d")
            .map_err(|e| StoreError::Invalid(format!("preferred date: {e}")))?;

        Ok(Self {
            is_owner: model.owner_id == viewer_id,
            id: model.id,
            room_id: model.room_id,
            requester_id: model.user_id,
            owner_id: model.owner_id,
            booking_type,
            preferred_date,
            preferred_time: model.preferred_time,
            message: model.message,
            status,
            created_at: from_millis(model.created_at),
        })
    }
}

/// Input for `BookingManager::request`
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub room_id: String,
    pub requester_id: String,
    pub owner_id: String,
    pub booking_type: BookingType,
    pub preferred_date: NaiveDate,
    pub preferred_time: String,
    pub message: Option<String>,
}

/// A room review with the reviewer's display name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub reviewer_name: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub(crate) fn from_model(model: reviews::Model, reviewer_name: String) -> Self {
        Self {
            id: model.id,
            room_id: model.room_id,
            user_id: model.user_id,
            reviewer_name,
            rating: model.rating.clamp(0, 5) as u8,
            comment: model.comment,
            created_at: from_millis(model.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
}

impl From<profiles::Model> for Profile {
    fn from(model: profiles::Model) -> Self {
        Self {
            user_id: model.user_id,
            full_name: model.full_name,
            avatar_url: model.avatar_url,
            phone: model.phone,
        }
    }
}

/// What a flatmate seeker fills in about themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatmateDetails {
    pub looking_for_room: bool,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub preferred_location: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    pub occupation: Option<String>,
    pub age_range: Option<String>,
    pub bio: Option<String>,
    /// Lifestyle category to the chosen option, e.g. `schedule` -> `Night Owl`
    pub lifestyle: BTreeMap<String, String>,
}

impl Default for FlatmateDetails {
    fn default() -> Self {
        Self {
            looking_for_room: true,
            budget_min: None,
            budget_max: None,
            preferred_location: None,
            move_in_date: None,
            occupation: None,
            age_range: None,
            bio: None,
            lifestyle: BTreeMap::new(),
        }
    }
}

impl FlatmateDetails {
    /// "₹8,000 - ₹15,000", "Up to ₹15,000", "From ₹8,000" or "Not specified"
    pub fn budget_label(&self) -> String {
        let min = self.budget_min.filter(|v| *v > 0.0);
        let max = self.budget_max.filter(|v| *v > 0.0);
        match (min, max) {
            (Some(min), Some(max)) => format!("{} - {}", rupees(min), rupees(max)),
            (None, Some(max)) => format!("Up to {}", rupees(max)),
            (Some(min), None) => format!("From {}", rupees(min)),
            (None, None) => "Not specified".to_string(),
        }
    }
}

/// Whole rupees with thousands separators
pub fn rupees(amount: f64) -> String {
    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("₹{}", out)
}

/// A flatmate profile with the owner's display name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatmateProfile {
    pub user_id: String,
    pub full_name: String,
    #[serde(flatten)]
    pub details: FlatmateDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlatmateProfile {
    pub(crate) fn from_model(model: flatmate_profiles::Model, full_name: String) -> Result<Self> {
        let move_in_date = model
            .move_in_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| StoreError::Invalid(format!("move-in date: {e}")))?;

        Ok(Self {
            user_id: model.user_id,
            full_name,
            details: FlatmateDetails {
                looking_for_room: model.looking_for_room,
                budget_min: model.budget_min,
                budget_max: model.budget_max,
                preferred_location: model.preferred_location,
                move_in_date,
                occupation: model.occupation,
                age_range: model.age_range,
                bio: model.bio,
                lifestyle: serde_json::from_str(&model.lifestyle_json)?,
            },
            created_at: from_millis(model.created_at),
            updated_at: from_millis(model.updated_at),
        })
    }
}

/// Binary payload handed to object storage
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Blob {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Read a local file into memory
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    /// File extension used for the storage key, `bin` when unknown
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }
}
