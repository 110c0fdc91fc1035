//! Room reviews

use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr,
};
use tracing::{info, warn};

use crate::backend::Directory;
use crate::directory::DbDirectory;
use crate::entities::reviews;
use crate::error::{Result, StoreError};
use crate::records::Review;

pub const ANONYMOUS_REVIEWER: &str = "Anonymous";

#[derive(Clone)]
pub struct ReviewManager {
    db: DatabaseConnection,
    directory: DbDirectory,
}

impl ReviewManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            directory: DbDirectory::new(db.clone()),
            db,
        }
    }

    async fn reviewer_name(&self, user_id: &str) -> String {
        match self.directory.display_name(user_id).await {
            Ok(Some(name)) => name,
            Ok(None) => ANONYMOUS_REVIEWER.to_string(),
            Err(e) => {
                warn!("Reviewer lookup failed for {}: {}", user_id, e);
                ANONYMOUS_REVIEWER.to_string()
            }
        }
    }

    /// Submit a 1-5 star review; one review per user per room
    pub async fn submit(
        &self,
        room_id: &str,
        user_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Review> {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::Invalid(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let existing = reviews::Entity::find()
            .filter(reviews::Column::RoomId.eq(room_id))
            .filter(reviews::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(StoreError::Conflict(format!(
                "{} already reviewed {}",
                user_id, room_id
            )));
        }

        let now = Utc::now().timestamp_millis();
        let model = reviews::Model {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            rating: i32::from(rating),
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };
        let active = reviews::ActiveModel {
            id: Set(model.id.clone()),
            room_id: Set(model.room_id.clone()),
            user_id: Set(model.user_id.clone()),
            rating: Set(model.rating),
            comment: Set(model.comment.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match reviews::Entity::insert(active)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(StoreError::Conflict(format!(
                    "{} already reviewed {}",
                    user_id, room_id
                )))
            }
            Err(e) => return Err(e.into()),
        }

        info!("Review {} added to room {}", model.id, room_id);
        let name = self.reviewer_name(user_id).await;
        Ok(Review::from_model(model, name))
    }

    /// Reviews for a room, newest first
    pub async fn list_for_room(&self, room_id: &str) -> Result<Vec<Review>> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::RoomId.eq(room_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let name = self.reviewer_name(&row.user_id).await;
            out.push(Review::from_model(row, name));
        }
        Ok(out)
    }

    pub async fn delete(&self, user_id: &str, review_id: &str) -> Result<()> {
        let review = reviews::Entity::find_by_id(review_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("review {}", review_id)))?;

        if review.user_id != user_id {
            return Err(StoreError::Forbidden(
                "only the author may delete a review".to_string(),
            ));
        }

        reviews::Entity::delete_by_id(review_id.to_string())
            .exec(&self.db)
            .await?;
        info!("Deleted review {}", review_id);
        Ok(())
    }

    /// Mean rating for a room, 0 when it has no reviews
    pub async fn average_rating(&self, room_id: &str) -> Result<f64> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::RoomId.eq(room_id))
            .all(&self.db)
            .await?;
        if rows.is_empty() {
            return Ok(0.0);
        }
        let total: i64 = rows.iter().map(|r| i64::from(r.rating)).sum();
        Ok(total as f64 / rows.len() as f64)
    }
}
