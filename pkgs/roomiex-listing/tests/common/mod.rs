// Copyright 2025 RoomieX Team.
//
// Shared helpers for roomiex-listing integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use roomiex_auth::{AccountManager, AuthContext, Viewer};
use roomiex_listing::{AnalysisError, CategoryScore, RoomAnalysis, RoomAnalyzer};
use roomiex_store::migration::{Migrator, MigratorTrait};
use roomiex_store::{Blob, ListingStore, LocalObjectStorage, ObjectStorage, StoreError};
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

pub struct Harness {
    _file: NamedTempFile,
    pub uploads: TempDir,
    pub db: DatabaseConnection,
    pub listings: ListingStore,
    pub storage: LocalObjectStorage,
    pub accounts: AccountManager,
}

impl Harness {
    pub async fn new() -> Self {
        let file = NamedTempFile::new().unwrap();
        let db = sea_orm::Database::connect(&format!(
            "sqlite:{}?mode=rwc",
            file.path().to_str().unwrap().replace('\\', "/")
        ))
        .await
        .expect("Failed to connect to database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let uploads = tempfile::tempdir().unwrap();
        Self {
            _file: file,
            storage: LocalObjectStorage::new(uploads.path(), "https://cdn.test"),
            uploads,
            listings: ListingStore::new(db.clone()),
            accounts: AccountManager::new(db.clone()),
            db,
        }
    }

    pub async fn client(&self, email: &str, full_name: &str) -> (AuthContext, Viewer) {
        let auth = AuthContext::new(Arc::new(self.accounts.clone()));
        let viewer = auth
            .sign_up(email, "secret-pass", full_name)
            .await
            .expect("Failed to sign up");
        (auth, viewer)
    }
}

pub fn photo(name: &str) -> Blob {
    Blob::new(name, Bytes::from(format!("image bytes of {name}")))
}

fn category(score: f64) -> CategoryScore {
    CategoryScore {
        score,
        feedback: "Looks fine".to_string(),
    }
}

pub fn analysis(overall: f64) -> RoomAnalysis {
    RoomAnalysis {
        overall_score: overall,
        lighting: category(overall),
        cleanliness: category(overall),
        space: category(overall),
        ventilation: category(overall),
        furnishing: category(overall),
        summary: "A tidy room".to_string(),
        improvements: vec!["Add a lamp".to_string()],
    }
}

/// Returns a fixed score and remembers which file it was shown
pub struct StubAnalyzer {
    pub score: f64,
    pub seen: parking_lot::Mutex<Vec<String>>,
    pub fail: bool,
}

impl StubAnalyzer {
    pub fn scoring(score: f64) -> Self {
        Self {
            score,
            seen: parking_lot::Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::scoring(0.0)
        }
    }
}

#[async_trait]
impl RoomAnalyzer for StubAnalyzer {
    async fn analyze(&self, photo: &Blob) -> Result<RoomAnalysis, AnalysisError> {
        self.seen.lock().push(photo.file_name.clone());
        if self.fail {
            return Err(AnalysisError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }
        Ok(analysis(self.score))
    }
}

/// Storage that accepts a fixed number of uploads and then fails
pub struct FlakyStorage {
    pub inner: LocalObjectStorage,
    pub allowed: usize,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ObjectStorage for FlakyStorage {
    async fn upload(&self, blob: &Blob, folder: &str) -> roomiex_store::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.allowed {
            return Err(StoreError::Unavailable("storage offline".to_string()));
        }
        self.inner.upload(blob, folder).await
    }
}
