//! Profile manager for user display details

use chrono::Utc;
use sea_orm::{
    prelude::Expr, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::debug;

use crate::entities::profiles;
use crate::error::{Result, StoreError};
use crate::records::Profile;

#[derive(Clone)]
pub struct ProfileManager {
    db: DatabaseConnection,
}

impl ProfileManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the profile row for a new user unless it already exists
    pub async fn ensure(&self, user_id: &str, full_name: &str) -> Result<Profile> {
        if let Some(existing) = self.get(user_id).await? {
            return Ok(existing);
        }

        let now = Utc::now().timestamp_millis();
        let profile = profiles::ActiveModel {
            user_id: Set(user_id.to_string()),
            full_name: Set(Some(full_name.trim().to_string())),
            avatar_url: Set(None),
            phone: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        profiles::Entity::insert(profile)
            .exec_without_returning(&self.db)
            .await?;

        debug!("Created profile for {}", user_id);
        Ok(Profile {
            user_id: user_id.to_string(),
            full_name: Some(full_name.trim().to_string()),
            avatar_url: None,
            phone: None,
        })
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = profiles::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?;
        Ok(profile.map(Profile::from))
    }

    pub async fn update_full_name(&self, user_id: &str, full_name: &str) -> Result<()> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(StoreError::Invalid("full name is empty".to_string()));
        }

        let result = profiles::Entity::update_many()
            .col_expr(profiles::Column::FullName, Expr::value(full_name))
            .col_expr(
                profiles::Column::UpdatedAt,
                Expr::value(Utc::now().timestamp_millis()),
            )
            .filter(profiles::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("profile {}", user_id)));
        }
        debug!("Updated profile name for {}", user_id);
        Ok(())
    }
}
