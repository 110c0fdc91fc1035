//! Conversation list: one row per thread the viewer takes part in.
//!
//! Every change touching the viewer triggers a full re-fetch and
//! re-partition of the viewer's messages. Summaries are never patched
//! incrementally, so the list is always a pure function of the stored
//! message set at the time of the last fetch.

use chrono::{DateTime, TimeZone};
use parking_lot::Mutex;
use roomiex_auth::{AuthContext, AuthState};
use roomiex_store::{Directory, Message, MessageBackend, MessageFilter, Subscription};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buckets::time_label;
use crate::config::SessionConfig;
use crate::error::{ChatError, Result};
use crate::session::LoadStatus;
use crate::thread::ThreadKey;

pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_ROOM: &str = "Unknown Room";
pub const DIRECT_MESSAGE_TITLE: &str = "Direct message";

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub key: ThreadKey,
    pub counterpart_name: String,
    /// Listing title for room-scoped threads
    pub room_title: Option<String>,
    pub last_message: Message,
    /// Unread messages addressed to the viewer in this thread
    pub unread_count: usize,
}

impl ConversationSummary {
    pub fn title(&self) -> &str {
        self.room_title.as_deref().unwrap_or(DIRECT_MESSAGE_TITLE)
    }

    /// Case-insensitive match on counterpart name or room title
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.counterpart_name.to_lowercase().contains(&query)
            || self.title().to_lowercase().contains(&query)
    }

    pub fn time_label<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        time_label(self.last_message.created_at, now)
    }
}

/// Partition `messages` into threads as seen by `viewer_id`, newest thread
/// first. Names are left as placeholders.
pub fn summarize(viewer_id: &str, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut threads: HashMap<ThreadKey, ConversationSummary> = HashMap::new();

    for message in messages.iter().filter(|m| m.involves(viewer_id)) {
        let key = ThreadKey::for_message(message, viewer_id);
        let unread = usize::from(message.is_addressed_to(viewer_id) && !message.read);

        match threads.get_mut(&key) {
            Some(summary) => {
                summary.unread_count += unread;
                let latest = &summary.last_message;
                if (message.created_at, &message.id) > (latest.created_at, &latest.id) {
                    summary.last_message = message.clone();
                }
            }
            None => {
                let room_title = key.topic_id.as_ref().map(|_| UNKNOWN_ROOM.to_string());
                threads.insert(
                    key.clone(),
                    ConversationSummary {
                        key,
                        counterpart_name: UNKNOWN_USER.to_string(),
                        room_title,
                        last_message: message.clone(),
                        unread_count: unread,
                    },
                );
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = threads.into_values().collect();
    summaries.sort_by(|a, b| {
        (b.last_message.created_at, &b.last_message.id)
            .cmp(&(a.last_message.created_at, &a.last_message.id))
    });
    summaries
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboxView {
    pub status: LoadStatus,
    pub conversations: Vec<ConversationSummary>,
}

impl InboxView {
    pub fn total_unread(&self) -> usize {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }
}

enum InboxCommand {
    Refresh { reply: oneshot::Sender<Result<()>> },
}

/// Live conversation list for the signed-in viewer
pub struct Inbox {
    viewer_id: String,
    commands: mpsc::Sender<InboxCommand>,
    view: watch::Receiver<InboxView>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Inbox {
    pub async fn open(
        auth: &AuthContext,
        backend: Arc<dyn MessageBackend>,
        directory: Arc<dyn Directory>,
        config: &SessionConfig,
    ) -> Result<Self> {
        let mut auth_rx = auth.watch();
        let AuthState { epoch, viewer } = auth_rx.borrow_and_update().clone();
        let viewer = viewer.ok_or(ChatError::NotSignedIn)?;
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (view_tx, view_rx) = watch::channel(InboxView {
            status: LoadStatus::Loading,
            conversations: Vec::new(),
        });

        let subscription = backend.subscribe(MessageFilter::participant(&viewer.id));
        let mut actor = InboxActor {
            viewer_id: viewer.id.clone(),
            epoch,
            backend,
            directory,
            view: view_tx,
        };
        if let Err(e) = actor.recompute().await {
            warn!("Initial inbox load failed: {}", e);
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(actor.run(subscription, command_rx, auth_rx, cancel.clone()));
        info!("Opened inbox for {}", viewer.id);

        Ok(Self {
            viewer_id: viewer.id,
            commands: command_tx,
            view: view_rx,
            cancel,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    pub fn view(&self) -> watch::Receiver<InboxView> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> InboxView {
        self.view.borrow().clone()
    }

    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.view.borrow().conversations.clone()
    }

    pub fn search(&self, query: &str) -> Vec<ConversationSummary> {
        self.view
            .borrow()
            .conversations
            .iter()
            .filter(|c| c.matches(query))
            .cloned()
            .collect()
    }

    /// Recompute now; read-state changes are not part of the change feed
    pub async fn refresh(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(InboxCommand::Refresh { reply })
            .await
            .map_err(|_| ChatError::Closed)?;
        response.await.map_err(|_| ChatError::Closed)?
    }

    pub async fn close(&self) {
        self.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Inbox task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct InboxActor {
    viewer_id: String,
    epoch: u64,
    backend: Arc<dyn MessageBackend>,
    directory: Arc<dyn Directory>,
    view: watch::Sender<InboxView>,
}

impl InboxActor {
    async fn run(
        mut self,
        mut subscription: Subscription,
        mut commands: mpsc::Receiver<InboxCommand>,
        mut auth: watch::Receiver<AuthState>,
        cancel: CancellationToken,
    ) {
        loop {
            if auth.borrow_and_update().epoch != self.epoch {
                info!("Auth state changed, closing inbox");
                break;
            }

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = auth.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                item = subscription.next() => match item {
                    Some(item) => {
                        debug!("Inbox change: {:?}", item);
                        None
                    }
                    None => break,
                },
                command = commands.recv() => match command {
                    Some(InboxCommand::Refresh { reply }) => Some(reply),
                    None => break,
                },
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = auth.changed() => break,
                result = self.recompute() => {
                    if let Some(reply) = reply {
                        let _ = reply.send(result);
                    } else if let Err(e) = result {
                        warn!("Inbox refresh failed: {}", e);
                    }
                }
            }
        }

        drop(subscription);
        self.view.send_modify(|view| view.status = LoadStatus::Closed);
    }

    async fn recompute(&mut self) -> Result<()> {
        let filter = MessageFilter::participant(&self.viewer_id);
        let messages = match self.backend.query(&filter).await {
            Ok(messages) => messages,
            Err(e) => {
                let reason = e.to_string();
                self.view
                    .send_modify(|view| view.status = LoadStatus::Failed(reason));
                return Err(e.into());
            }
        };

        let mut conversations = summarize(&self.viewer_id, &messages);
        self.resolve_names(&mut conversations).await;
        debug!("Inbox has {} conversation(s)", conversations.len());

        self.view.send_replace(InboxView {
            status: LoadStatus::Ready,
            conversations,
        });
        Ok(())
    }

    /// Fill in display names; lookups that fail keep the placeholder
    async fn resolve_names(&self, conversations: &mut [ConversationSummary]) {
        let mut names: HashMap<String, String> = HashMap::new();
        let mut titles: HashMap<String, String> = HashMap::new();

        for summary in conversations.iter_mut() {
            let user_id = summary.key.counterpart_id.clone();
            if !names.contains_key(&user_id) {
                let name = match self.directory.display_name(&user_id).await {
                    Ok(Some(name)) => name,
                    Ok(None) => UNKNOWN_USER.to_string(),
                    Err(e) => {
                        warn!("Name lookup failed for {}: {}", user_id, e);
                        UNKNOWN_USER.to_string()
                    }
                };
                names.insert(user_id.clone(), name);
            }
            if let Some(name) = names.get(&user_id) {
                summary.counterpart_name = name.clone();
            }

            let Some(room_id) = summary.key.topic_id.clone() else {
                continue;
            };
            if !titles.contains_key(&room_id) {
                let title = match self.directory.listing_title(&room_id).await {
                    Ok(Some(title)) => title,
                    Ok(None) => UNKNOWN_ROOM.to_string(),
                    Err(e) => {
                        warn!("Title lookup failed for {}: {}", room_id, e);
                        UNKNOWN_ROOM.to_string()
                    }
                };
                titles.insert(room_id.clone(), title);
            }
            summary.room_title = titles.get(&room_id).cloned();
        }
    }
}
