//! Local filesystem object storage

use async_trait::async_trait;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::backend::ObjectStorage;
use crate::error::{Result, StoreError};
use crate::records::Blob;

/// `{folder}/{unix_millis}-{7 random chars}.{ext}`
pub fn object_key(folder: &str, extension: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!(
        "{}/{}-{}.{}",
        folder.trim_matches('/'),
        Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    #[instrument(skip(self, blob), fields(file = %blob.file_name, size = blob.bytes.len()))]
    async fn upload(&self, blob: &Blob, folder: &str) -> Result<String> {
        if folder.trim_matches('/').is_empty() {
            return Err(StoreError::Invalid("upload folder is empty".to_string()));
        }

        let key = object_key(folder, &blob.extension());
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &blob.bytes).await?;

        debug!("Stored object at {}", path.display());
        Ok(format!("{}/{}", self.public_base_url.trim_end_matches('/'), key))
    }
}
