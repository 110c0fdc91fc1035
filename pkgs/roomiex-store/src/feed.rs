//! In-process change feed for the message collection
//!
//! Every insert and delete is published on a bounded broadcast channel.
//! Subscribers re-filter events locally and are told when they fell behind,
//! in which case they must re-fetch to resynchronise.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::filter::MessageFilter;
use crate::records::Message;

/// A row-level change on the message collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Inserted(Message),
    Deleted(Message),
}

impl ChangeEvent {
    pub fn message(&self) -> &Message {
        match self {
            ChangeEvent::Inserted(m) | ChangeEvent::Deleted(m) => m,
        }
    }
}

/// What a subscriber observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedItem {
    Change(ChangeEvent),
    /// `n` events were dropped because the subscriber was too slow
    Lagged(u64),
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!("Published change to {} subscriber(s)", receivers);
    }

    pub fn subscribe(&self, filter: MessageFilter) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live, filtered view of the change feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    filter: MessageFilter,
}

impl Subscription {
    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }

    /// Next matching event, or `None` once the feed is gone
    pub async fn next(&mut self) -> Option<FeedItem> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(event.message()) => {
                    return Some(FeedItem::Change(event))
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Some(FeedItem::Lagged(skipped)),
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
