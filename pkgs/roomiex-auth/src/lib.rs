//! Viewer identity for RoomieX
//!
//! This crate provides:
//! - Account sign-up and sign-in against a local `accounts` table
//! - Argon2id password hashing
//! - `AuthContext`, the process-wide holder of the signed-in viewer. Sign-out
//!   is broadcast to every session that watches the context.

pub mod account_manager;
pub mod context;
pub mod entities;
pub mod error;
pub mod migration;
pub mod password;

pub use account_manager::{AccountManager, IdentityProvider};
pub use context::{AuthContext, AuthState, Viewer};
pub use error::{AuthError, Result};
