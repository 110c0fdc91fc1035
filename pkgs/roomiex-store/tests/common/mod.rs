// Copyright 2025 RoomieX Team.
//
// Shared helpers for roomiex-store integration tests

#![allow(dead_code)]

use roomiex_store::migration::{Migrator, MigratorTrait};
use roomiex_store::NewMessage;
use sea_orm::DatabaseConnection;
use tempfile::NamedTempFile;

pub async fn create_test_db(path: &NamedTempFile) -> DatabaseConnection {
    let db = sea_orm::Database::connect(&format!(
        "sqlite:{}?mode=rwc",
        path.path().to_str().unwrap().replace('\\', "/")
    ))
    .await
    .expect("Failed to connect to database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn new_message(sender: &str, receiver: &str, room: Option<&str>, text: &str) -> NewMessage {
    NewMessage {
        sender_id: sender.to_string(),
        receiver_id: receiver.to_string(),
        room_id: room.map(str::to_string),
        content: text.to_string(),
    }
}
