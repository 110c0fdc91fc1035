//! Row predicates shared by queries and the change feed

use crate::records::Message;

/// Which messages a query or subscription is interested in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageFilter {
    /// One conversation between `viewer_id` and `counterpart_id`.
    /// `room_id: None` selects only topic-less (direct) messages.
    Thread {
        viewer_id: String,
        counterpart_id: String,
        room_id: Option<String>,
    },
    /// Every message the user sent or received
    Participant { user_id: String },
}

impl MessageFilter {
    pub fn thread(viewer_id: &str, counterpart_id: &str, room_id: Option<&str>) -> Self {
        MessageFilter::Thread {
            viewer_id: viewer_id.to_string(),
            counterpart_id: counterpart_id.to_string(),
            room_id: room_id.map(str::to_string),
        }
    }

    pub fn participant(user_id: &str) -> Self {
        MessageFilter::Participant {
            user_id: user_id.to_string(),
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageFilter::Thread {
                viewer_id,
                counterpart_id,
                room_id,
            } => {
                message.room_id == *room_id
                    && ((message.sender_id == *viewer_id && message.receiver_id == *counterpart_id)
                        || (message.sender_id == *counterpart_id
                            && message.receiver_id == *viewer_id))
            }
            MessageFilter::Participant { user_id } => message.involves(user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(sender: &str, receiver: &str, room: Option<&str>) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            room_id: room.map(str::to_string),
            content: "hello".to_string(),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_direct_thread_excludes_room_messages() {
        let direct = MessageFilter::thread("a", "b", None);
        assert!(direct.matches(&message("a", "b", None)));
        assert!(direct.matches(&message("b", "a", None)));
        assert!(!direct.matches(&message("a", "b", Some("r1"))));
        assert!(!direct.matches(&message("a", "c", None)));
    }

    #[test]
    fn test_room_thread_requires_same_topic() {
        let room = MessageFilter::thread("b", "a", Some("r1"));
        assert!(room.matches(&message("a", "b", Some("r1"))));
        assert!(!room.matches(&message("a", "b", Some("r2"))));
        assert!(!room.matches(&message("a", "b", None)));
        assert!(!room.matches(&message("c", "b", Some("r1"))));
    }

    #[test]
    fn test_participant_filter() {
        let filter = MessageFilter::participant("a");
        assert!(filter.matches(&message("a", "b", None)));
        assert!(filter.matches(&message("c", "a", Some("r1"))));
        assert!(!filter.matches(&message("b", "c", None)));
    }
}
