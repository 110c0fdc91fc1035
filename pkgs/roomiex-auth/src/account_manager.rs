//! Account manager for signing up and signing in

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{debug, info, warn};

use crate::context::Viewer;
use crate::entities::accounts;
use crate::error::{AuthError, Result};
use crate::password::{self, MIN_PASSWORD_LEN};

/// Identity collaborator consumed by [`crate::AuthContext`]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<Viewer>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Viewer>;
}

/// Account manager backed by the `accounts` table
#[derive(Clone)]
pub struct AccountManager {
    db: DatabaseConnection,
}

impl From<accounts::Model> for Viewer {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
        }
    }
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Check if an account exists for an email address
    pub async fn has_account(&self, email: &str) -> Result<bool> {
        let email = normalize_email(email)?;
        let count = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Look up an account by id
    pub async fn find(&self, id: &str) -> Result<Option<Viewer>> {
        let account = accounts::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;

        Ok(account.map(Viewer::from))
    }

    /// Look up an account by email address
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Viewer>> {
        let email = normalize_email(email)?;
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(account.map(Viewer::from))
    }

    async fn create(&self, email: &str, password: &str, full_name: &str) -> Result<Viewer> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        if self.has_account(&email).await? {
            warn!("Sign-up rejected, account exists for {}", email);
            return Err(AuthError::AccountExists(email));
        }

        let password_hash = password::hash_password(password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        let account = accounts::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(email.clone()),
            full_name: Set(full_name.trim().to_string()),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now().timestamp_millis()),
        };

        let model = account.insert(&self.db).await?;
        info!("Account created for {} ({})", model.email, model.id);

        Ok(model.into())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Viewer> {
        let Ok(email) = normalize_email(email) else {
            return Err(AuthError::InvalidCredentials);
        };
        debug!("Attempting sign-in for {}", email);

        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, &account.password_hash) {
            warn!("Password check failed for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        info!("Signed in {} ({})", account.email, account.id);
        Ok(account.into())
    }
}

#[async_trait]
impl IdentityProvider for AccountManager {
    async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<Viewer> {
        self.create(email, password, full_name).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Viewer> {
        self.authenticate(email, password).await
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail(email)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Priya@Example.COM ").unwrap(),
            "priya@example.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("user@localhost").is_err());
    }
}
