use std::fs;
use std::path::{Path, PathBuf};

use roomiex_chat::SessionConfig;
use roomiex_listing::GeminiConfig;
use roomiex_store::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/roomiex.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub storage_root: PathBuf,
    pub public_base_url: String,
    pub feed_capacity: usize,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub command_buffer: usize,
    pub event_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let store = StoreConfig::default();
        let session = SessionConfig::default();
        Self {
            db_path: store.db_path,
            storage_root: store.storage_root,
            public_base_url: store.public_base_url,
            feed_capacity: store.feed_capacity,
            gemini_api_key: String::new(),
            gemini_model: GeminiConfig::default().model,
            command_buffer: session.command_buffer,
            event_buffer: session.event_buffer,
        }
    }
}

impl AppConfig {
    /// Environment (and `.env`) values win over the file
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup("ROOMIEX_DB") {
            self.db_path = PathBuf::from(db);
        }
        if let Some(root) = lookup("ROOMIEX_UPLOADS") {
            self.storage_root = PathBuf::from(root);
        }
        if let Some(url) = lookup("ROOMIEX_PUBLIC_URL") {
            self.public_base_url = url;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini_model = model;
        }
    }

    pub fn store(&self) -> StoreConfig {
        StoreConfig {
            db_path: self.db_path.clone(),
            feed_capacity: self.feed_capacity,
            public_base_url: self.public_base_url.clone(),
            storage_root: self.storage_root.clone(),
        }
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            ..GeminiConfig::default()
        }
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            command_buffer: self.command_buffer,
            event_buffer: self.event_buffer,
        }
    }
}

pub fn load_config(path: &Path) -> AppConfig {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
