//! Message store - SQLite-backed message collection with a live change feed

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sea_orm::{
    prelude::Expr, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, info, instrument, warn};

use crate::backend::MessageBackend;
use crate::entities::messages;
use crate::error::{Result, StoreError};
use crate::feed::{ChangeEvent, ChangeFeed, Subscription};
use crate::filter::MessageFilter;
use crate::records::{from_millis, Message, NewMessage};

/// Message store - persists messages and publishes inserts/deletes
pub struct MessageStore {
    db: DatabaseConnection,
    feed: ChangeFeed,
    /// Last assigned creation timestamp (Unix millis)
    clock: Mutex<i64>,
}

impl MessageStore {
    pub fn new(db: DatabaseConnection, feed_capacity: usize) -> Self {
        Self {
            db,
            feed: ChangeFeed::new(feed_capacity),
            clock: Mutex::new(0),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Server-side timestamp, strictly increasing within this process
    fn next_timestamp(&self) -> i64 {
        let mut last = self.clock.lock();
        let now = Utc::now().timestamp_millis();
        *last = now.max(*last + 1);
        *last
    }

    fn condition(filter: &MessageFilter) -> Condition {
        match filter {
            MessageFilter::Thread {
                viewer_id,
                counterpart_id,
                room_id,
            } => {
                let topic = match room_id {
                    Some(room_id) => messages::Column::RoomId.eq(room_id.as_str()),
                    None => messages::Column::RoomId.is_null(),
                };
                Condition::all().add(topic).add(
                    Condition::any()
                        .add(
                            Condition::all()
                                .add(messages::Column::SenderId.eq(viewer_id.as_str()))
                                .add(messages::Column::ReceiverId.eq(counterpart_id.as_str())),
                        )
                        .add(
                            Condition::all()
                                .add(messages::Column::SenderId.eq(counterpart_id.as_str()))
                                .add(messages::Column::ReceiverId.eq(viewer_id.as_str())),
                        ),
                )
            }
            MessageFilter::Participant { user_id } => Condition::any()
                .add(messages::Column::SenderId.eq(user_id.as_str()))
                .add(messages::Column::ReceiverId.eq(user_id.as_str())),
        }
    }

    /// Count unread messages addressed to `user_id`
    pub async fn unread_count(&self, user_id: &str) -> Result<u64> {
        let count = messages::Entity::find()
            .filter(messages::Column::ReceiverId.eq(user_id))
            .filter(messages::Column::Read.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl MessageBackend for MessageStore {
    #[instrument(skip(self))]
    async fn query(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        let rows = messages::Entity::find()
            .filter(Self::condition(filter))
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await?;

        debug!("Query returned {} message(s)", rows.len());
        Ok(rows.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self, message), fields(sender = %message.sender_id, receiver = %message.receiver_id))]
    async fn insert(&self, message: NewMessage) -> Result<Message> {
        if message.content.trim().is_empty() {
            return Err(StoreError::Invalid("message content is empty".to_string()));
        }
        if message.sender_id == message.receiver_id {
            return Err(StoreError::Invalid(
                "sender and receiver must differ".to_string(),
            ));
        }

        let created_at = self.next_timestamp();
        let model = messages::Model {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            room_id: message.room_id,
            content: message.content,
            read: false,
            created_at,
        };

        let active = messages::ActiveModel {
            id: Set(model.id.clone()),
            sender_id: Set(model.sender_id.clone()),
            receiver_id: Set(model.receiver_id.clone()),
            room_id: Set(model.room_id.clone()),
            content: Set(model.content.clone()),
            read: Set(false),
            created_at: Set(created_at),
        };
        messages::Entity::insert(active)
            .exec_without_returning(&self.db)
            .await?;

        let stored = Message::from(model);
        debug!(message_id = %stored.id, at = %from_millis(created_at), "Stored message");
        self.feed.publish(ChangeEvent::Inserted(stored.clone()));
        Ok(stored)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn mark_read(&self, receiver_id: &str, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = messages::Entity::update_many()
            .col_expr(messages::Column::Read, Expr::value(true))
            .filter(messages::Column::Id.is_in(ids.iter().cloned()))
            .filter(messages::Column::ReceiverId.eq(receiver_id))
            .filter(messages::Column::Read.eq(false))
            .exec(&self.db)
            .await?;

        debug!("Marked {} message(s) read", result.rows_affected);
        Ok(result.rows_affected)
    }

    #[instrument(skip(self))]
    async fn delete(&self, requester_id: &str, message_id: &str) -> Result<()> {
        let Some(model) = messages::Entity::find_by_id(message_id.to_string())
            .one(&self.db)
            .await?
        else {
            debug!("Message {} already gone", message_id);
            return Ok(());
        };

        if model.sender_id != requester_id {
            warn!("Rejected delete of {} by non-sender", message_id);
            return Err(StoreError::Forbidden(
                "only the sender may delete a message".to_string(),
            ));
        }

        messages::Entity::delete_by_id(message_id.to_string())
            .exec(&self.db)
            .await?;

        info!("Deleted message {}", message_id);
        self.feed.publish(ChangeEvent::Deleted(Message::from(model)));
        Ok(())
    }

    fn subscribe(&self, filter: MessageFilter) -> Subscription {
        self.feed.subscribe(filter)
    }
}
