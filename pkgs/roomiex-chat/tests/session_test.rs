// Copyright 2025 RoomieX Team.
//
// Comprehensive tests for ConversationSession

mod common;

use common::{wait_for_event, wait_for_view, FlakyBackend, Harness, TIMEOUT};
use roomiex_chat::{
    ChatError, CloseReason, ConversationSession, LoadStatus, MessageComposer, SessionConfig,
    SessionEvent, ThreadKey,
};
use roomiex_store::{MessageBackend, MessageFilter};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn config() -> SessionConfig {
    SessionConfig::default()
}

#[tokio::test]
async fn test_open_backfills_and_marks_read() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    h.post(&alice, &bob, None, "Hi Bob").await;
    h.post(&alice, &bob, None, "Is the room free?").await;
    h.post(&bob, &alice, None, "Yes").await;

    let (session, _events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();

    let view = session.snapshot();
    assert_eq!(view.status, LoadStatus::Ready);
    assert_eq!(view.messages.len(), 3);
    assert!(view
        .messages
        .windows(2)
        .all(|w| w[0].created_at <= w[1].created_at));
    assert!(view.messages.iter().all(|m| m.read || m.sender_id == bob.id));
    assert_eq!(h.store.unread_count(&bob.id).await.unwrap(), 0);
    // Bob's own message is still unread for Alice
    assert_eq!(h.store.unread_count(&alice.id).await.unwrap(), 1);

    session.close().await;
}

#[tokio::test]
async fn test_incoming_message_notifies_and_is_marked_read() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    let (session, mut events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::room(&alice.id, "room-1"),
        &config(),
    )
    .await
    .unwrap();
    let mut view = session.view();

    let sent = h.post(&alice, &bob, Some("room-1"), "Can I visit?").await;

    match wait_for_event(&mut events, |e| matches!(e, SessionEvent::Incoming(_))).await {
        SessionEvent::Incoming(message) => assert_eq!(message.id, sent.id),
        other => panic!("unexpected event {:?}", other),
    }

    let view = wait_for_view(&mut view, |v| v.messages.iter().any(|m| m.id == sent.id && m.read)).await;
    assert_eq!(view.messages.len(), 1);
    assert_eq!(h.store.unread_count(&bob.id).await.unwrap(), 0);

    session.close().await;
}

#[tokio::test]
async fn test_send_appears_once_via_echo() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, _) = h.client("bob@example.com", "Bob").await;
    let backend = FlakyBackend::new(h.store.clone());
    backend.echo_twice.store(true, Ordering::SeqCst);

    let (session, mut events) = ConversationSession::open(
        &bob_auth,
        backend.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();
    let mut view = session.view();

    let sent = session.send("  Hello Alice  ").await.unwrap().unwrap();
    assert_eq!(sent.content, "Hello Alice");

    let second = session.send("Still there?").await.unwrap().unwrap();
    let view = wait_for_view(&mut view, |v| v.messages.iter().any(|m| m.id == second.id)).await;

    let ids: Vec<&str> = view.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec![sent.id.as_str(), second.id.as_str()]);
    assert!(view.can_delete(&view.messages[0]));
    assert!(!view.sending);

    // Own messages never raise an incoming notification
    session.close().await;
    while let Some(event) = events.recv().await {
        assert!(!matches!(event, SessionEvent::Incoming(_)));
    }
}

#[tokio::test]
async fn test_blank_send_does_not_insert() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, _) = h.client("bob@example.com", "Bob").await;
    let backend = FlakyBackend::new(h.store.clone());

    let (session, _events) = ConversationSession::open(
        &bob_auth,
        backend.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();

    assert!(session.send("   \n\t").await.unwrap().is_none());
    let mut composer = MessageComposer::new();
    composer.set_draft("  ");
    assert!(!composer.can_send());
    assert!(composer.submit(&session).await.unwrap().is_none());

    assert_eq!(backend.insert_calls.load(Ordering::SeqCst), 0);
    assert!(session.snapshot().messages.is_empty());
    session.close().await;
}

#[tokio::test]
async fn test_direct_and_room_threads_are_separate() {
    let h = Harness::new().await;
    let (alice_auth, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    let (to_bob, _events) = ConversationSession::open(
        &alice_auth,
        h.store.clone(),
        ThreadKey::direct(&bob.id),
        &config(),
    )
    .await
    .unwrap();
    to_bob.send("direct hello").await.unwrap();
    h.post(&alice, &bob, Some("room-R"), "about room R").await;

    let direct = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap()
    .0;
    let room = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::room(&alice.id, "room-R"),
        &config(),
    )
    .await
    .unwrap()
    .0;
    let other_room = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::room(&alice.id, "room-T2"),
        &config(),
    )
    .await
    .unwrap()
    .0;

    let direct_view = direct.snapshot();
    assert_eq!(direct_view.messages.len(), 1);
    assert_eq!(direct_view.messages[0].content, "direct hello");

    let room_view = room.snapshot();
    assert_eq!(room_view.messages.len(), 1);
    assert_eq!(room_view.messages[0].content, "about room R");

    assert!(other_room.snapshot().messages.is_empty());

    // A live room message reaches only the room thread
    let mut room_rx = room.view();
    let live = h.post(&alice, &bob, Some("room-R"), "second about R").await;
    wait_for_view(&mut room_rx, |v| v.messages.iter().any(|m| m.id == live.id)).await;
    assert_eq!(direct.snapshot().messages.len(), 1);
    assert!(other_room.snapshot().messages.is_empty());

    for session in [&to_bob, &direct, &room, &other_room] {
        session.close().await;
    }
}

#[tokio::test]
async fn test_delete_removes_message_and_tolerates_repeats() {
    let h = Harness::new().await;
    let (alice_auth, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    let (alice_session, _a_events) = ConversationSession::open(
        &alice_auth,
        h.store.clone(),
        ThreadKey::direct(&bob.id),
        &config(),
    )
    .await
    .unwrap();
    let (bob_session, _b_events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();
    let mut alice_view = alice_session.view();
    let mut bob_view = bob_session.view();

    let sent = alice_session.send("typo").await.unwrap().unwrap();
    wait_for_view(&mut bob_view, |v| v.messages.iter().any(|m| m.id == sent.id)).await;

    alice_session.delete(&sent.id).await.unwrap();
    assert!(!alice_session
        .snapshot()
        .messages
        .iter()
        .any(|m| m.id == sent.id));
    wait_for_view(&mut bob_view, |v| v.messages.is_empty()).await;

    // Deleting again changes nothing and does not fail
    alice_session.delete(&sent.id).await.unwrap();
    let view = wait_for_view(&mut alice_view, |v| v.status == LoadStatus::Ready).await;
    assert!(view.messages.is_empty());

    alice_session.close().await;
    bob_session.close().await;
}

#[tokio::test]
async fn test_failed_delete_reconciles_by_refetch() {
    let h = Harness::new().await;
    let (alice_auth, alice) = h.client("alice@example.com", "Alice").await;
    let (_, bob) = h.client("bob@example.com", "Bob").await;
    let backend = FlakyBackend::new(h.store.clone());

    let kept = h.post(&alice, &bob, None, "keep me").await;
    let (session, _events) = ConversationSession::open(
        &alice_auth,
        backend.clone(),
        ThreadKey::direct(&bob.id),
        &config(),
    )
    .await
    .unwrap();
    assert_eq!(session.snapshot().messages.len(), 1);

    backend.fail_delete.store(true, Ordering::SeqCst);
    let err = session.delete(&kept.id).await.unwrap_err();
    assert!(matches!(err, ChatError::Backend(_)));

    let view = session.snapshot();
    assert_eq!(view.status, LoadStatus::Ready);
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].id, kept.id);

    session.close().await;
}

#[tokio::test]
async fn test_only_sender_delete_is_accepted() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    let theirs = h.post(&alice, &bob, None, "mine, not Bob's").await;
    let (session, _events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();
    assert!(!session.snapshot().can_delete(&theirs));

    let err = session.delete(&theirs.id).await.unwrap_err();
    assert!(matches!(err, ChatError::Backend(_)));
    assert_eq!(session.snapshot().messages.len(), 1);

    session.close().await;
}

#[tokio::test]
async fn test_failed_backfill_is_recoverable() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;
    h.post(&alice, &bob, None, "hello").await;

    let backend = FlakyBackend::new(h.store.clone());
    backend.fail_query.store(true, Ordering::SeqCst);

    let (session, mut events) = ConversationSession::open(
        &bob_auth,
        backend.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();

    let view = session.snapshot();
    assert!(matches!(view.status, LoadStatus::Failed(_)));
    assert!(view.messages.is_empty());
    assert!(matches!(
        wait_for_event(&mut events, |_| true).await,
        SessionEvent::Error(ChatError::Backend(_))
    ));

    backend.fail_query.store(false, Ordering::SeqCst);
    session.reload().await.unwrap();
    let view = session.snapshot();
    assert_eq!(view.status, LoadStatus::Ready);
    assert_eq!(view.messages.len(), 1);

    session.close().await;
}

#[tokio::test]
async fn test_failed_send_keeps_draft() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, _) = h.client("bob@example.com", "Bob").await;
    let backend = FlakyBackend::new(h.store.clone());

    let (session, _events) = ConversationSession::open(
        &bob_auth,
        backend.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();

    let mut composer = MessageComposer::new();
    composer.set_draft("Is it available from June?");

    backend.fail_insert.store(true, Ordering::SeqCst);
    assert!(composer.submit(&session).await.is_err());
    assert_eq!(composer.draft(), "Is it available from June?");
    assert!(!session.snapshot().sending);

    backend.fail_insert.store(false, Ordering::SeqCst);
    assert!(composer.submit(&session).await.unwrap().is_some());
    assert_eq!(composer.draft(), "");

    session.close().await;
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let h = Harness::new().await;
    let (alice_auth, alice) = h.client("alice@example.com", "Alice").await;
    let (_, bob) = h.client("bob@example.com", "Bob").await;

    let (session, _events) = ConversationSession::open(
        &alice_auth,
        h.store.clone(),
        ThreadKey::direct(&bob.id),
        &config(),
    )
    .await
    .unwrap();

    let ids = vec!["missing-id".to_string()];
    assert_eq!(session.mark_read(&ids).await.unwrap(), 0);
    assert_eq!(session.mark_read(&ids).await.unwrap(), 0);
    assert_eq!(session.mark_read(&[]).await.unwrap(), 0);
    assert_eq!(h.store.unread_count(&alice.id).await.unwrap(), 0);

    session.close().await;
}

#[tokio::test]
async fn test_close_stops_delivery() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    let (session, mut events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();

    session.close().await;
    session.close().await;
    assert!(session.is_closed());

    h.post(&alice, &bob, None, "too late").await;

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    assert_eq!(seen.len(), 1);
    assert!(matches!(seen[0], SessionEvent::Closed(CloseReason::Requested)));
    assert!(session.snapshot().messages.is_empty());
    assert!(matches!(session.send("hi").await, Err(ChatError::Closed)));
    assert_eq!(h.store.feed().subscriber_count(), 0);
}

#[tokio::test]
async fn test_sign_out_forces_close() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, _) = h.client("bob@example.com", "Bob").await;

    let (session, mut events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();
    let mut view = session.view();

    bob_auth.sign_out();

    assert!(matches!(
        wait_for_event(&mut events, |e| matches!(e, SessionEvent::Closed(_))).await,
        SessionEvent::Closed(CloseReason::SignedOut)
    ));
    wait_for_view(&mut view, |v| v.status == LoadStatus::Closed).await;
    session.close().await;
}

#[tokio::test]
async fn test_sign_out_then_sign_in_again_still_closes() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;

    let (session, mut events) = ConversationSession::open(
        &bob_auth,
        h.store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();

    // The session task never observes the signed-out state in between
    bob_auth.sign_out();
    bob_auth.restore(bob.clone());

    assert!(matches!(
        wait_for_event(&mut events, |e| matches!(e, SessionEvent::Closed(_))).await,
        SessionEvent::Closed(CloseReason::SignedOut)
    ));
    assert!(matches!(session.send("still here?").await, Err(ChatError::Closed)));
    assert_eq!(session.snapshot().status, LoadStatus::Closed);
    session.close().await;
}

/// Open Bob's thread with Alice over a backend that parks inserts, and start
/// a send that is held before it reaches the store
async fn open_with_held_send(
    h: &Harness,
) -> (
    roomiex_auth::AuthContext,
    Arc<FlakyBackend>,
    Arc<ConversationSession>,
    tokio::sync::mpsc::Receiver<SessionEvent>,
    tokio::task::JoinHandle<roomiex_chat::Result<Option<roomiex_store::Message>>>,
) {
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, _) = h.client("bob@example.com", "Bob").await;
    let backend = FlakyBackend::new(h.store.clone());

    let (session, events) = ConversationSession::open(
        &bob_auth,
        backend.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();
    let session = Arc::new(session);

    backend.hold_insert.store(true, Ordering::SeqCst);
    let sender = {
        let session = session.clone();
        tokio::spawn(async move { session.send("are you there?").await })
    };
    tokio::time::timeout(TIMEOUT, backend.held.notified())
        .await
        .expect("Insert was never issued");

    (bob_auth, backend, session, events, sender)
}

async fn drain(events: &mut tokio::sync::mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    while let Some(event) = tokio::time::timeout(TIMEOUT, events.recv())
        .await
        .expect("Event channel left open")
    {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn test_close_abandons_send_in_flight() {
    let h = Harness::new().await;
    let (_, backend, session, mut events, sender) = open_with_held_send(&h).await;

    session.close().await;
    backend.release.notify_waiters();

    let result = sender.await.unwrap();
    assert!(matches!(result, Err(ChatError::Closed)));

    let view = session.snapshot();
    assert_eq!(view.status, LoadStatus::Closed);
    assert!(!view.sending);
    assert!(view.messages.is_empty());

    let seen = drain(&mut events).await;
    assert_eq!(seen.len(), 1);
    assert!(matches!(seen[0], SessionEvent::Closed(CloseReason::Requested)));

    // The parked insert was dropped before it reached the store
    assert_eq!(backend.insert_calls.load(Ordering::SeqCst), 1);
    let stored = h
        .store
        .query(&MessageFilter::participant(session.viewer_id()))
        .await
        .unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_sign_out_abandons_send_in_flight() {
    let h = Harness::new().await;
    let (bob_auth, backend, session, mut events, sender) = open_with_held_send(&h).await;

    bob_auth.sign_out();

    let result = sender.await.unwrap();
    assert!(matches!(result, Err(ChatError::Closed)));
    let seen = drain(&mut events).await;
    assert_eq!(seen.len(), 1);
    assert!(matches!(seen[0], SessionEvent::Closed(CloseReason::SignedOut)));
    assert_eq!(session.snapshot().status, LoadStatus::Closed);

    backend.release.notify_waiters();
    let stored = h
        .store
        .query(&MessageFilter::participant(session.viewer_id()))
        .await
        .unwrap();
    assert!(stored.is_empty());
    session.close().await;
}

#[tokio::test]
async fn test_open_requires_viewer() {
    let h = Harness::new().await;
    let (auth, viewer) = h.client("alice@example.com", "Alice").await;

    let own = ConversationSession::open(
        &auth,
        h.store.clone(),
        ThreadKey::direct(&viewer.id),
        &config(),
    )
    .await;
    assert!(matches!(own, Err(ChatError::SelfConversation)));

    auth.sign_out();
    let signed_out = ConversationSession::open(
        &auth,
        h.store.clone(),
        ThreadKey::direct("someone"),
        &config(),
    )
    .await;
    assert!(matches!(signed_out, Err(ChatError::NotSignedIn)));

    // Nothing was left subscribed
    assert_eq!(h.store.feed().subscriber_count(), 0);
    let all = h
        .store
        .query(&MessageFilter::participant(&viewer.id))
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_feed_lag_triggers_resync() {
    let h = Harness::new().await;
    let (_, alice) = h.client("alice@example.com", "Alice").await;
    let (bob_auth, bob) = h.client("bob@example.com", "Bob").await;
    // A tiny feed so a burst overflows it
    let store = Arc::new(roomiex_store::MessageStore::new(h.db.clone(), 2));

    let (session, _events) = ConversationSession::open(
        &bob_auth,
        store.clone(),
        ThreadKey::direct(&alice.id),
        &config(),
    )
    .await
    .unwrap();
    let mut view = session.view();

    for i in 0..10 {
        store
            .insert(roomiex_store::NewMessage {
                sender_id: alice.id.clone(),
                receiver_id: bob.id.clone(),
                room_id: None,
                content: format!("burst {}", i),
            })
            .await
            .unwrap();
    }

    let view = wait_for_view(&mut view, |v| v.messages.len() == 10).await;
    assert!(view
        .messages
        .windows(2)
        .all(|w| w[0].created_at <= w[1].created_at));
    session.close().await;
}
