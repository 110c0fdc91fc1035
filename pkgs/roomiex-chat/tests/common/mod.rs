// Copyright 2025 RoomieX Team.
//
// Shared helpers for roomiex-chat integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use roomiex_auth::{AccountManager, AuthContext, Viewer};
use roomiex_chat::{SessionEvent, ThreadView};
use roomiex_store::migration::{Migrator, MigratorTrait};
use roomiex_store::{
    ChangeEvent, Message, MessageBackend, MessageFilter, MessageStore, NewMessage, StoreError,
    Subscription,
};
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, watch, Notify};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub struct Harness {
    _file: NamedTempFile,
    pub db: DatabaseConnection,
    pub store: Arc<MessageStore>,
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

        Self {
            _file: file,
            store: Arc::new(MessageStore::new(db.clone(), 64)),
            accounts: AccountManager::new(db.clone()),
            db,
        }
    }

    /// A separate client signed in as a fresh account
    pub async fn client(&self, email: &str, full_name: &str) -> (AuthContext, Viewer) {
        let auth = AuthContext::new(Arc::new(self.accounts.clone()));
        let viewer = auth
            .sign_up(email, "secret-pass", full_name)
            .await
            .expect("Failed to sign up");
        (auth, viewer)
    }

    pub async fn post(&self, from: &Viewer, to: &Viewer, room: Option<&str>, text: &str) -> Message {
        self.store
            .insert(NewMessage {
                sender_id: from.id.clone(),
                receiver_id: to.id.clone(),
                room_id: room.map(str::to_string),
                content: text.to_string(),
            })
            .await
            .expect("Failed to insert message")
    }
}

/// Wait until the view satisfies `pred`
pub async fn wait_for_view(
    view: &mut watch::Receiver<ThreadView>,
    pred: impl FnMut(&ThreadView) -> bool,
) -> ThreadView {
    tokio::time::timeout(TIMEOUT, view.wait_for(pred))
        .await
        .expect("Timed out waiting for view")
        .expect("Session view dropped")
        .clone()
}

/// Next event satisfying `pred`, skipping others
pub async fn wait_for_event(
    events: &mut mpsc::Receiver<SessionEvent>,
    mut pred: impl FnMut(&SessionEvent) -> bool,
) -> SessionEvent {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            match events.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("Event channel closed"),
            }
        }
    })
    .await
    .expect("Timed out waiting for event")
}

/// Wraps a real store and fails selected operations on demand
pub struct FlakyBackend {
    pub inner: Arc<MessageStore>,
    pub fail_query: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    /// Publish every insert twice
    pub echo_twice: AtomicBool,
    /// Park inserts before they reach the store until `release` fires
    pub hold_insert: AtomicBool,
    /// Signalled when an insert is parked
    pub held: Notify,
    pub release: Notify,
    pub insert_calls: AtomicUsize,
}

impl FlakyBackend {
    pub fn new(inner: Arc<MessageStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_query: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            echo_twice: AtomicBool::new(false),
            hold_insert: AtomicBool::new(false),
            held: Notify::new(),
            release: Notify::new(),
            insert_calls: AtomicUsize::new(0),
        })
    }

    fn unavailable() -> StoreError {
        StoreError::Unavailable("injected failure".to_string())
    }
}

#[async_trait]
impl MessageBackend for FlakyBackend {
    async fn query(&self, filter: &MessageFilter) -> roomiex_store::Result<Vec<Message>> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.query(filter).await
    }

    async fn insert(&self, message: NewMessage) -> roomiex_store::Result<Message> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_insert.load(Ordering::SeqCst) {
            let release = self.release.notified();
            self.held.notify_one();
            release.await;
        }
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let stored = self.inner.insert(message).await?;
        if self.echo_twice.load(Ordering::SeqCst) {
            self.inner
                .feed()
                .publish(ChangeEvent::Inserted(stored.clone()));
        }
        Ok(stored)
    }

    async fn mark_read(&self, receiver_id: &str, ids: &[String]) -> roomiex_store::Result<u64> {
        self.inner.mark_read(receiver_id, ids).await
    }

    async fn delete(&self, requester_id: &str, message_id: &str) -> roomiex_store::Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.inner.delete(requester_id, message_id).await
    }

    fn subscribe(&self, filter: MessageFilter) -> Subscription {
        self.inner.subscribe(filter)
    }
}
