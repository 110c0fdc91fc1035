//! Conversation session: one open chat thread
//!
//! A session is a task that exclusively owns the thread's [`ConversationLog`].
//! User actions reach it as commands over a bounded channel and change
//! notifications arrive through a feed [`Subscription`]; one loop consumes
//! both. Closing cancels the task and waits for it, so once [`close`] returns
//! nothing can touch the log or emit on the session's behalf.
//!
//! [`close`]: ConversationSession::close

use chrono::{DateTime, TimeZone};
use parking_lot::Mutex;
use roomiex_auth::{AuthContext, AuthState};
use roomiex_store::{ChangeEvent, FeedItem, Message, MessageBackend, NewMessage, Subscription};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::buckets::{group_by_day, DayGroup};
use crate::config::SessionConfig;
use crate::error::{ChatError, Result};
use crate::log::ConversationLog;
use crate::thread::ThreadKey;

/// Load state shared by sessions and the inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    /// The last fetch failed; the view shows what is known (possibly nothing)
    Failed(String),
    Closed,
}

/// Snapshot of an open thread for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView {
    pub key: ThreadKey,
    pub viewer_id: String,
    pub status: LoadStatus,
    pub messages: Vec<Message>,
    /// A send is in flight
    pub sending: bool,
}

impl ThreadView {
    fn loading(key: &ThreadKey, viewer_id: &str) -> Self {
        Self {
            key: key.clone(),
            viewer_id: viewer_id.to_string(),
            status: LoadStatus::Loading,
            messages: Vec::new(),
            sending: false,
        }
    }

    pub fn is_own(&self, message: &Message) -> bool {
        message.sender_id == self.viewer_id
    }

    /// Whether to offer the delete action; the backend has the final say
    pub fn can_delete(&self, message: &Message) -> bool {
        self.is_own(message)
    }

    pub fn by_day<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DayGroup> {
        group_by_day(&self.messages, now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` was called or the handle was dropped
    Requested,
    /// The viewer signed out or switched accounts
    SignedOut,
    /// The change feed shut down
    FeedEnded,
}

/// Notifications for the UI layer
#[derive(Debug)]
pub enum SessionEvent {
    /// The counterpart wrote while the thread was open
    Incoming(Message),
    /// A background operation failed; dismissable
    Error(ChatError),
    Closed(CloseReason),
}

enum Command {
    Send {
        text: String,
        reply: oneshot::Sender<Result<Option<Message>>>,
    },
    Delete {
        message_id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    MarkRead {
        ids: Vec<String>,
        reply: oneshot::Sender<Result<u64>>,
    },
    Reload {
        reply: oneshot::Sender<Result<()>>,
    },
}

enum Step {
    Feed(FeedItem),
    Command(Command),
}

/// Handle to an open thread
pub struct ConversationSession {
    key: ThreadKey,
    viewer_id: String,
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<ThreadView>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationSession {
    /// Open `key` for the signed-in viewer.
    ///
    /// Subscribes, backfills and marks the backfilled messages read before
    /// returning. A failed backfill still yields a session: its view is empty
    /// with [`LoadStatus::Failed`] and an error event is queued; call
    /// [`reload`](Self::reload) to retry.
    #[instrument(skip(auth, backend, key, config), fields(thread = %key))]
    pub async fn open(
        auth: &AuthContext,
        backend: Arc<dyn MessageBackend>,
        key: ThreadKey,
        config: &SessionConfig,
    ) -> Result<(Self, mpsc::Receiver<SessionEvent>)> {
        let mut auth_rx = auth.watch();
        let AuthState { epoch, viewer } = auth_rx.borrow_and_update().clone();
        let viewer = viewer.ok_or(ChatError::NotSignedIn)?;
        if key.counterpart_id == viewer.id {
            return Err(ChatError::SelfConversation);
        }

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let (view_tx, view_rx) = watch::channel(ThreadView::loading(&key, &viewer.id));

        // Subscribe before the backfill so nothing written in between is missed
        let subscription = backend.subscribe(key.filter(&viewer.id));

        let mut actor = SessionActor {
            key: key.clone(),
            viewer_id: viewer.id.clone(),
            epoch,
            log: ConversationLog::new(&viewer.id, &key),
            backend,
            status: LoadStatus::Loading,
            sending: false,
            view: view_tx,
            events: event_tx,
        };
        if let Err(e) = actor.backfill().await {
            actor.emit(SessionEvent::Error(e));
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(actor.run(subscription, command_rx, auth_rx, cancel.clone()));
        info!("Opened conversation {}", key);

        Ok((
            Self {
                key,
                viewer_id: viewer.id,
                commands: command_tx,
                view: view_rx,
                cancel,
                task: Mutex::new(Some(task)),
            },
            event_rx,
        ))
    }

    pub fn key(&self) -> &ThreadKey {
        &self.key
    }

    pub fn viewer_id(&self) -> &str {
        &self.viewer_id
    }

    /// Receiver that observes every view change
    pub fn view(&self) -> watch::Receiver<ThreadView> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> ThreadView {
        self.view.borrow().clone()
    }

    /// Send `text` to the counterpart.
    ///
    /// Blank text returns `Ok(None)` without contacting the backend. The new
    /// message is not added locally; it appears when the feed echoes it.
    pub async fn send(&self, text: &str) -> Result<Option<Message>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let text = text.to_string();
        self.request(|reply| Command::Send { text, reply }).await
    }

    /// Remove a message locally at once, then remotely. On remote failure the
    /// thread is re-fetched and the error returned.
    pub async fn delete(&self, message_id: &str) -> Result<()> {
        let message_id = message_id.to_string();
        self.request(|reply| Command::Delete { message_id, reply })
            .await
    }

    /// Mark messages addressed to the viewer as read. Safe to repeat.
    pub async fn mark_read(&self, ids: &[String]) -> Result<u64> {
        let ids = ids.to_vec();
        self.request(|reply| Command::MarkRead { ids, reply }).await
    }

    /// Re-run the backfill
    pub async fn reload(&self) -> Result<()> {
        self.request(|reply| Command::Reload { reply }).await
    }

    /// Tear down the subscription and wait for the session task to finish.
    /// Idempotent.
    pub async fn close(&self) {
        self.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Session task for {} ended abnormally: {}", self.key, e);
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ChatError::Closed)?;
        response.await.map_err(|_| ChatError::Closed)?
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct SessionActor {
    key: ThreadKey,
    viewer_id: String,
    /// Auth epoch the session was opened in
    epoch: u64,
    log: ConversationLog,
    backend: Arc<dyn MessageBackend>,
    status: LoadStatus,
    sending: bool,
    view: watch::Sender<ThreadView>,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut subscription: Subscription,
        mut commands: mpsc::Receiver<Command>,
        mut auth: watch::Receiver<AuthState>,
        cancel: CancellationToken,
    ) {
        let reason = loop {
            // Any sign-in or sign-out since opening ends the session
            if auth.borrow_and_update().epoch != self.epoch {
                break CloseReason::SignedOut;
            }

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => break CloseReason::Requested,
                changed = auth.changed() => {
                    if changed.is_err() {
                        break CloseReason::SignedOut;
                    }
                    continue;
                }
                item = subscription.next() => match item {
                    Some(item) => Step::Feed(item),
                    None => break CloseReason::FeedEnded,
                },
                command = commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => break CloseReason::Requested,
                },
            };

            // Work in flight when the session closes is abandoned, not applied
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break CloseReason::Requested,
                _ = auth.changed() => break CloseReason::SignedOut,
                _ = self.apply(step) => {}
            }
        };

        drop(subscription);
        self.status = LoadStatus::Closed;
        self.sending = false;
        self.publish();
        self.emit(SessionEvent::Closed(reason));
        info!("Closed conversation {} ({:?})", self.key, reason);
    }

    async fn apply(&mut self, step: Step) {
        match step {
            Step::Feed(FeedItem::Change(ChangeEvent::Inserted(message))) => {
                self.on_inserted(message).await
            }
            Step::Feed(FeedItem::Change(ChangeEvent::Deleted(message))) => {
                if self.log.remove(&message.id).is_some() {
                    debug!(message_id = %message.id, "Removed deleted message");
                    self.publish();
                }
            }
            Step::Feed(FeedItem::Lagged(skipped)) => {
                warn!("Feed lagged by {} event(s), resynchronising {}", skipped, self.key);
                if let Err(e) = self.backfill().await {
                    self.emit(SessionEvent::Error(e));
                }
            }
            Step::Command(command) => self.handle(command).await,
        }
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Send { text, reply } => {
                let _ = reply.send(self.send(text).await);
            }
            Command::Delete { message_id, reply } => {
                let _ = reply.send(self.delete(message_id).await);
            }
            Command::MarkRead { ids, reply } => {
                let _ = reply.send(self.mark_read(ids).await);
            }
            Command::Reload { reply } => {
                let _ = reply.send(self.backfill().await);
            }
        }
    }

    async fn on_inserted(&mut self, message: Message) {
        let from_counterpart = message.sender_id == self.key.counterpart_id;
        if !self.log.insert(message.clone()) {
            debug!(message_id = %message.id, "Ignored duplicate or foreign insert");
            return;
        }
        self.publish();

        if from_counterpart {
            let id = message.id.clone();
            self.emit(SessionEvent::Incoming(message));
            // The thread is on screen, so the message has been seen
            if let Err(e) = self.mark_read(vec![id]).await {
                self.emit(SessionEvent::Error(e));
            }
        }
    }

    async fn backfill(&mut self) -> Result<()> {
        self.status = LoadStatus::Loading;
        self.publish();

        let filter = self.key.filter(&self.viewer_id);
        match self.backend.query(&filter).await {
            Ok(messages) => {
                self.log.replace_all(messages);
                self.status = LoadStatus::Ready;
                self.publish();
                debug!("Backfilled {} message(s) for {}", self.log.len(), self.key);
            }
            Err(e) => {
                warn!("Backfill failed for {}: {}", self.key, e);
                self.log.clear();
                self.status = LoadStatus::Failed(e.to_string());
                self.publish();
                return Err(e.into());
            }
        }

        let unread = self.log.unread_ids();
        if let Err(e) = self.mark_read(unread).await {
            self.emit(SessionEvent::Error(e));
        }
        Ok(())
    }

    async fn send(&mut self, text: String) -> Result<Option<Message>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        self.sending = true;
        self.publish();
        let result = self
            .backend
            .insert(NewMessage {
                sender_id: self.viewer_id.clone(),
                receiver_id: self.key.counterpart_id.clone(),
                room_id: self.key.topic_id.clone(),
                content: text,
            })
            .await;
        self.sending = false;
        self.publish();

        let message = result?;
        debug!(message_id = %message.id, "Sent message");
        Ok(Some(message))
    }

    async fn delete(&mut self, message_id: String) -> Result<()> {
        if self.log.remove(&message_id).is_some() {
            self.publish();
        }

        if let Err(e) = self.backend.delete(&self.viewer_id, &message_id).await {
            warn!(message_id = %message_id, "Delete failed, reloading thread: {}", e);
            if let Err(reload) = self.backfill().await {
                debug!("Reload after failed delete also failed: {}", reload);
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn mark_read(&mut self, ids: Vec<String>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let updated = self.backend.mark_read(&self.viewer_id, &ids).await?;
        if self.log.mark_read(&ids) > 0 {
            self.publish();
        }
        Ok(updated)
    }

    fn publish(&self) {
        self.view.send_replace(ThreadView {
            key: self.key.clone(),
            viewer_id: self.viewer_id.clone(),
            status: self.status.clone(),
            messages: self.log.messages().to_vec(),
            sending: self.sending,
        });
    }

    fn emit(&self, event: SessionEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event queue full, dropping {:?}", event)
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
