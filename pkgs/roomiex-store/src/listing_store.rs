//! Listing store - room listings created through the wizard

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tracing::{info, instrument};

use crate::backend::ListingBackend;
use crate::entities::room_listings;
use crate::error::{Result, StoreError};
use crate::records::{NewListing, RoomListing};

pub const STATUS_PUBLISHED: &str = "published";

#[derive(Clone)]
pub struct ListingStore {
    db: DatabaseConnection,
}

impl ListingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn convert(rows: Vec<room_listings::Model>) -> Result<Vec<RoomListing>> {
        rows.into_iter().map(RoomListing::try_from).collect()
    }
}

#[async_trait]
impl ListingBackend for ListingStore {
    #[instrument(skip(self, listing), fields(owner = %listing.owner_id))]
    async fn insert_listing(&self, listing: NewListing) -> Result<RoomListing> {
        if listing.title.trim().is_empty() || listing.location.trim().is_empty() {
            return Err(StoreError::Invalid(
                "title and location are required".to_string(),
            ));
        }
        if !(listing.price.is_finite() && listing.price > 0.0) {
            return Err(StoreError::Invalid("price must be positive".to_string()));
        }

        let now = Utc::now().timestamp_millis();
        let model = room_listings::Model {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: listing.owner_id,
            title: listing.title,
            description: listing.description,
            location: listing.location,
            price: listing.price,
            bills_included: listing.bills_included,
            room_type: listing.room_type,
            available_from: listing.available_from,
            minimum_stay: listing.minimum_stay,
            amenities_json: serde_json::to_string(&listing.amenities)?,
            photos_json: serde_json::to_string(&listing.photos)?,
            ai_score: listing.ai_score,
            ai_analysis_json: listing
                .ai_analysis
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            status: listing.status,
            created_at: now,
            updated_at: now,
        };

        let active = room_listings::ActiveModel {
            id: Set(model.id.clone()),
            user_id: Set(model.user_id.clone()),
            title: Set(model.title.clone()),
            description: Set(model.description.clone()),
            location: Set(model.location.clone()),
            price: Set(model.price),
            bills_included: Set(model.bills_included),
            room_type: Set(model.room_type.clone()),
            available_from: Set(model.available_from.clone()),
            minimum_stay: Set(model.minimum_stay.clone()),
            amenities_json: Set(model.amenities_json.clone()),
            photos_json: Set(model.photos_json.clone()),
            ai_score: Set(model.ai_score),
            ai_analysis_json: Set(model.ai_analysis_json.clone()),
            status: Set(model.status.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        room_listings::Entity::insert(active)
            .exec_without_returning(&self.db)
            .await?;

        info!("Created listing {} ({})", model.id, model.title);
        RoomListing::try_from(model)
    }

    async fn get_listing(&self, id: &str) -> Result<Option<RoomListing>> {
        room_listings::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(RoomListing::try_from)
            .transpose()
    }

    async fn published_listings(&self) -> Result<Vec<RoomListing>> {
        let rows = room_listings::Entity::find()
            .filter(room_listings::Column::Status.eq(STATUS_PUBLISHED))
            .order_by_desc(room_listings::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Self::convert(rows)
    }

    async fn listings_by_owner(&self, owner_id: &str) -> Result<Vec<RoomListing>> {
        let rows = room_listings::Entity::find()
            .filter(room_listings::Column::UserId.eq(owner_id))
            .order_by_desc(room_listings::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Self::convert(rows)
    }
}
