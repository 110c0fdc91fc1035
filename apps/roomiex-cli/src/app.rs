use std::sync::Arc;

use anyhow::{bail, Context, Result};
use roomiex_auth::{AccountManager, AuthContext, Viewer};
use roomiex_listing::RoomDirectory;
use roomiex_store::{
    connect, BookingManager, DbDirectory, FlatmateManager, ListingStore, LocalObjectStorage,
    MessageStore, ProfileManager, ReviewManager, SavedRoomManager,
};
use tracing::info;

use crate::config::AppConfig;

/// Email and password given on the command line or in the environment
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    fn require(&self) -> Result<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => bail!("Sign-in required: pass --email and --password (or set ROOMIEX_EMAIL / ROOMIEX_PASSWORD)"),
        }
    }
}

/// Every collaborator the commands need, wired to one database
pub struct App {
    pub config: AppConfig,
    pub accounts: AccountManager,
    pub auth: AuthContext,
    pub messages: Arc<MessageStore>,
    pub listings: Arc<ListingStore>,
    pub rooms: Arc<RoomDirectory>,
    pub storage: LocalObjectStorage,
    pub profiles: ProfileManager,
    pub saved: SavedRoomManager,
    pub bookings: BookingManager,
    pub reviews: ReviewManager,
    pub flatmates: FlatmateManager,
}

impl App {
    pub async fn open(config: AppConfig) -> Result<Self> {
        let store_config = config.store();
        let db = connect(&store_config)
            .await
            .with_context(|| format!("Failed to open {}", store_config.db_path.display()))?;

        let accounts = AccountManager::new(db.clone());
        let listings = Arc::new(ListingStore::new(db.clone()));
        let rooms = Arc::new(RoomDirectory::new(
            listings.clone(),
            Arc::new(DbDirectory::new(db.clone())),
        ));

        Ok(Self {
            auth: AuthContext::new(Arc::new(accounts.clone())),
            accounts,
            messages: Arc::new(MessageStore::new(db.clone(), store_config.feed_capacity)),
            listings,
            rooms,
            storage: LocalObjectStorage::new(
                store_config.storage_root.clone(),
                store_config.public_base_url.clone(),
            ),
            profiles: ProfileManager::new(db.clone()),
            saved: SavedRoomManager::new(db.clone()),
            bookings: BookingManager::new(db.clone()),
            reviews: ReviewManager::new(db.clone()),
            flatmates: FlatmateManager::new(db),
            config,
        })
    }

    pub async fn sign_up(&self, credentials: &Credentials, full_name: &str) -> Result<Viewer> {
        let (email, password) = credentials.require()?;
        let viewer = self
            .auth
            .sign_up(email, password, full_name)
            .await
            .context("Sign-up failed")?;
        self.profiles
            .ensure(&viewer.id, &viewer.full_name)
            .await
            .context("Failed to create profile")?;
        info!("Signed up {} ({})", viewer.email, viewer.id);
        Ok(viewer)
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Viewer> {
        let (email, password) = credentials.require()?;
        let viewer = self
            .auth
            .sign_in(email, password)
            .await
            .context("Sign-in failed")?;
        Ok(viewer)
    }

    /// Account id registered for `email`
    pub async fn account_id(&self, email: &str) -> Result<String> {
        match self.accounts.find_by_email(email).await? {
            Some(viewer) => Ok(viewer.id),
            None => bail!("No account for {}", email),
        }
    }
}
