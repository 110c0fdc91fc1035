use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use roomiex_auth::Viewer;
use roomiex_chat::{
    clock_time, ConversationSession, Inbox, InboxView, LoadStatus, MessageComposer, SessionEvent,
    ThreadKey, ThreadView, UNKNOWN_USER,
};
use roomiex_store::{Directory, MessageBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::app::App;

fn show_help() {
    println!("\n📖 Commands:");
    println!("  <text>          Send a message");
    println!("  /delete <n>     Delete your message number n");
    println!("  /retry          Resend the last unsent draft");
    println!("  /reload         Fetch the thread again");
    println!("  /quit           Leave the conversation");
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Lines typed on stdin, forwarded until EOF
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (sender, receiver) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

/// Whom to talk to: an account email or a flatmate profile's user id
#[derive(Debug, Clone, Copy, Default)]
pub struct Counterpart<'a> {
    pub email: Option<&'a str>,
    pub flatmate: Option<&'a str>,
}

/// Work out whom to talk to and whether the thread is about a room
async fn thread_key(
    app: &App,
    viewer: &Viewer,
    with: Counterpart<'_>,
    room_id: Option<&str>,
) -> Result<ThreadKey> {
    let counterpart = match (with.email, with.flatmate) {
        (Some(email), _) => Some(app.account_id(email).await?),
        (None, Some(user_id)) => match app.flatmates.get(user_id).await? {
            Some(profile) => Some(profile.user_id),
            None => bail!("No flatmate profile {}", user_id),
        },
        (None, None) => None,
    };

    let Some(room_id) = room_id else {
        let Some(counterpart) = counterpart else {
            bail!("Pass --with <email> or --flatmate <id> for a direct conversation");
        };
        return Ok(ThreadKey::direct(counterpart));
    };

    let room = app.rooms.resolve(room_id).await?;
    if room.is_demo() {
        bail!("\"{}\" is a showcase room and has no owner to message", room.title());
    }
    let counterpart = match counterpart {
        Some(id) => id,
        None if room.can_message(&viewer.id) => room.owner_id().unwrap_or_default().to_string(),
        None => bail!("You own this room; pass --with <email> to pick the renter"),
    };
    Ok(ThreadKey::room(counterpart, room.id()))
}

/// Print messages of `view` not printed before, numbering own messages for `/delete`
fn render_new(view: &ThreadView, printed: &mut HashSet<String>, counterpart: &str) {
    let now = Local::now();
    for group in view.by_day(&now) {
        let fresh: Vec<_> = group
            .messages
            .iter()
            .filter(|m| !printed.contains(&m.id))
            .collect();
        if fresh.is_empty() {
            continue;
        }
        println!("\n── {} ──", group.bucket);
        for message in fresh {
            let position = view.messages.iter().position(|m| m.id == message.id);
            let who = if view.is_own(message) { "You" } else { counterpart };
            let number = match position {
                Some(n) if view.can_delete(message) => format!("[{}] ", n + 1),
                _ => String::new(),
            };
            println!(
                "{}{} {}: {}",
                number,
                clock_time(message.created_at, &Local),
                who,
                message.content
            );
            printed.insert(message.id.clone());
        }
    }
}

#[instrument(skip(app, viewer))]
pub async fn run_chat(
    app: &App,
    viewer: &Viewer,
    with: Counterpart<'_>,
    room_id: Option<&str>,
    refresh_secs: u64,
) -> Result<()> {
    let key = thread_key(app, viewer, with, room_id).await?;
    let counterpart = app
        .rooms
        .display_name(&key.counterpart_id)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| UNKNOWN_USER.to_string());

    let backend: Arc<dyn MessageBackend> = app.messages.clone();
    let (session, mut events) =
        ConversationSession::open(&app.auth, backend, key.clone(), &app.config.session()).await?;
    info!("Opened conversation {}", key);

    match &key.topic_id {
        Some(topic) => {
            let title = app.rooms.listing_title(topic).await.ok().flatten();
            println!(
                "💬 {} about \"{}\"",
                counterpart,
                title.as_deref().unwrap_or(roomiex_chat::UNKNOWN_ROOM)
            );
        }
        None => println!("💬 {} (direct message)", counterpart),
    }
    show_help();

    let mut view = session.view();
    let mut printed = HashSet::new();
    render_new(&view.borrow_and_update(), &mut printed, &counterpart);

    let mut lines = spawn_stdin_reader();
    let mut composer = MessageComposer::new();
    let mut refresh = tokio::time::interval(Duration::from_secs(refresh_secs.max(1)));
    refresh.tick().await;

    loop {
        prompt();
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                match &snapshot.status {
                    LoadStatus::Failed(reason) => println!("\n⚠️  Could not load messages: {}", reason),
                    LoadStatus::Closed => break,
                    _ => {}
                }
                render_new(&snapshot, &mut printed, &counterpart);
            }

            Some(event) = events.recv() => match event {
                SessionEvent::Incoming(message) => debug!(message_id = %message.id, "Incoming message"),
                SessionEvent::Error(e) => println!("\n⚠️  {}", e),
                SessionEvent::Closed(reason) => {
                    println!("\n👋 Conversation closed ({:?})", reason);
                    break;
                }
            },

            line = lines.recv() => {
                let Some(line) = line else { break };
                let (command, arg) = line.split_once(' ').unwrap_or((line.as_str(), ""));
                match command {
                    "/quit" | "/q" => break,
                    "/help" => show_help(),
                    "/retry" => {
                        if let Err(e) = composer.submit(&session).await {
                            println!("⚠️  Send failed again: {}", e);
                        }
                    }
                    "/reload" => {
                        if let Err(e) = session.reload().await {
                            println!("⚠️  Reload failed: {}", e);
                        }
                    }
                    "/delete" => {
                        let snapshot = session.snapshot();
                        let target = arg
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| snapshot.messages.get(i))
                            .filter(|m| snapshot.can_delete(m));
                        match target {
                            Some(message) => match session.delete(&message.id).await {
                                Ok(()) => println!("🗑️  Deleted"),
                                Err(e) => println!("⚠️  Delete failed: {}", e),
                            },
                            None => println!("Pick one of your own numbered messages"),
                        }
                    }
                    _ => {
                        composer.set_draft(line.clone());
                        if let Err(e) = composer.submit(&session).await {
                            println!("⚠️  Send failed: {} (draft kept, type /retry to resend)", e);
                        }
                    }
                }
            }

            _ = refresh.tick() => {
                // Picks up writes from other processes sharing the database
                if let Err(e) = session.reload().await {
                    debug!("Periodic reload failed: {}", e);
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close().await;
    Ok(())
}

fn render_inbox(view: &InboxView, query: Option<&str>) {
    let now = Local::now();
    match &view.status {
        LoadStatus::Loading => println!("Loading conversations..."),
        LoadStatus::Failed(reason) => println!("⚠️  Could not load conversations: {}", reason),
        _ => {}
    }

    let rows: Vec<_> = view
        .conversations
        .iter()
        .filter(|c| query.map_or(true, |q| c.matches(q)))
        .collect();
    if rows.is_empty() {
        println!("No conversations yet.");
        return;
    }

    println!("📨 {} unread", view.total_unread());
    for summary in rows {
        let unread = if summary.unread_count > 0 {
            format!(" ({} new)", summary.unread_count)
        } else {
            String::new()
        };
        println!(
            "{:>10}  {} · {}{}\n            {}",
            summary.time_label(&now),
            summary.counterpart_name,
            summary.title(),
            unread,
            summary.last_message.content
        );
    }
}

#[instrument(skip(app))]
pub async fn run_inbox(app: &App, search: Option<&str>, watch: bool) -> Result<()> {
    let backend: Arc<dyn MessageBackend> = app.messages.clone();
    let directory: Arc<dyn Directory> = app.rooms.clone();
    let inbox = Inbox::open(&app.auth, backend, directory, &app.config.session()).await?;

    let mut view = inbox.view();
    view.wait_for(|v| v.status != LoadStatus::Loading).await?;
    render_inbox(&view.borrow_and_update(), search);

    if watch {
        let mut refresh = tokio::time::interval(Duration::from_secs(5));
        refresh.tick().await;
        loop {
            tokio::select! {
                changed = view.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    println!();
                    render_inbox(&view.borrow_and_update(), search);
                }
                _ = refresh.tick() => {
                    if let Err(e) = inbox.refresh().await {
                        debug!("Inbox refresh failed: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    inbox.close().await;
    Ok(())
}
