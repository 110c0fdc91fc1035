//! Saved rooms (favorites) per user

use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use tracing::info;

use crate::entities::saved_rooms;
use crate::error::Result;

#[derive(Clone)]
pub struct SavedRoomManager {
    db: DatabaseConnection,
}

impl SavedRoomManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn is_saved(&self, user_id: &str, room_id: &str) -> Result<bool> {
        let count = saved_rooms::Entity::find()
            .filter(saved_rooms::Column::UserId.eq(user_id))
            .filter(saved_rooms::Column::RoomId.eq(room_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Save or unsave a room; returns whether it is saved afterwards
    pub async fn toggle(&self, user_id: &str, room_id: &str) -> Result<bool> {
        if self.is_saved(user_id, room_id).await? {
            saved_rooms::Entity::delete_many()
                .filter(saved_rooms::Column::UserId.eq(user_id))
                .filter(saved_rooms::Column::RoomId.eq(room_id))
                .exec(&self.db)
                .await?;
            info!("Removed saved room {} for {}", room_id, user_id);
            return Ok(false);
        }

        let saved = saved_rooms::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            room_id: Set(room_id.to_string()),
            created_at: Set(Utc::now().timestamp_millis()),
        };
        saved_rooms::Entity::insert(saved)
            .exec_without_returning(&self.db)
            .await?;
        info!("Saved room {} for {}", room_id, user_id);
        Ok(true)
    }

    /// Room ids saved by `user_id`, most recently saved first
    pub async fn list(&self, user_id: &str) -> Result<Vec<String>> {
        let rows = saved_rooms::Entity::find()
            .filter(saved_rooms::Column::UserId.eq(user_id))
            .order_by_desc(saved_rooms::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.room_id).collect())
    }
}
