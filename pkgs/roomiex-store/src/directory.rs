//! Display-name lookups backed by the profiles, accounts and listings tables

use async_trait::async_trait;
use roomiex_auth::entities::accounts;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::backend::Directory;
use crate::entities::{profiles, room_listings};
use crate::error::Result;

#[derive(Clone)]
pub struct DbDirectory {
    db: DatabaseConnection,
}

impl DbDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Directory for DbDirectory {
    async fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        let profile_name = profiles::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .and_then(|p| p.full_name)
            .filter(|name| !name.trim().is_empty());
        if profile_name.is_some() {
            return Ok(profile_name);
        }

        // Fall back to the name given at sign-up
        let account = accounts::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?;
        Ok(account.map(|a| a.full_name).filter(|n| !n.trim().is_empty()))
    }

    async fn listing_title(&self, room_id: &str) -> Result<Option<String>> {
        let listing = room_listings::Entity::find_by_id(room_id.to_string())
            .one(&self.db)
            .await?;
        Ok(listing.map(|l| l.title))
    }
}
