//! Process-wide viewer identity
//!
//! `AuthContext` is built once at start-up and cloned into whatever needs the
//! signed-in viewer. Every sign-in and sign-out starts a new epoch; sessions
//! remember the epoch they were opened in and close as soon as it changes,
//! even if a later sign-in restores the same viewer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::account_manager::IdentityProvider;
use crate::error::Result;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

/// Viewer together with the epoch it was published in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub epoch: u64,
    pub viewer: Option<Viewer>,
}

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthState>,
}

/// Holder of the current viewer
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

impl AuthContext {
    /// Create a signed-out context over an identity provider
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(AuthState {
            epoch: 0,
            viewer: None,
        });
        Self {
            inner: Arc::new(Inner { provider, state }),
        }
    }

    /// Register a new account and sign in as it
    pub async fn sign_up(&self, email: &str, password: &str, full_name: &str) -> Result<Viewer> {
        let viewer = self.inner.provider.sign_up(email, password, full_name).await?;
        self.publish(Some(viewer.clone()));
        Ok(viewer)
    }

    /// Sign in, replacing any current viewer
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Viewer> {
        let viewer = self.inner.provider.sign_in(email, password).await?;
        self.publish(Some(viewer.clone()));
        Ok(viewer)
    }

    /// Adopt an already established session
    pub fn restore(&self, viewer: Viewer) {
        self.publish(Some(viewer));
    }

    /// Sign out. Every session opened for the previous viewer closes.
    pub fn sign_out(&self) {
        if self.current().is_some() {
            info!("Signing out");
        }
        self.publish(None);
    }

    /// The signed-in viewer, if any
    pub fn current(&self) -> Option<Viewer> {
        self.inner.state.borrow().viewer.clone()
    }

    /// Current viewer and epoch, read together
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every sign-in and sign-out
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    fn publish(&self, viewer: Option<Viewer>) {
        self.inner.state.send_modify(|state| {
            state.epoch += 1;
            state.viewer = viewer;
        });
    }
}
