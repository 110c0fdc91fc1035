//! Presentation helpers: day grouping and relative time labels.
//!
//! Everything here is computed from a caller-supplied "now" so a clock change
//! between renders only changes labels, never the stored log.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use roomiex_store::Message;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBucket {
    Today,
    Yesterday,
    On(NaiveDate),
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayBucket::Today => write!(f, "Today"),
            DayBucket::Yesterday => write!(f, "Yesterday"),
            DayBucket::On(date) => write!(f, "{}", date.format("%B %-d, %Y")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub bucket: DayBucket,
    pub messages: Vec<Message>,
}

pub fn bucket_for<Tz: TimeZone>(at: DateTime<Utc>, now: &DateTime<Tz>) -> DayBucket {
    let day = at.with_timezone(&now.timezone()).date_naive();
    let today = now.date_naive();
    if day == today {
        DayBucket::Today
    } else if today.pred_opt() == Some(day) {
        DayBucket::Yesterday
    } else {
        DayBucket::On(day)
    }
}

/// Split an ordered thread into consecutive day groups
pub fn group_by_day<Tz: TimeZone>(messages: &[Message], now: &DateTime<Tz>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for message in messages {
        let bucket = bucket_for(message.created_at, now);
        match groups.last_mut() {
            Some(group) if group.bucket == bucket => group.messages.push(message.clone()),
            _ => groups.push(DayGroup {
                bucket,
                messages: vec![message.clone()],
            }),
        }
    }
    groups
}

/// Inbox time label: clock time within 24h, "Yesterday" within 48h, else the date
pub fn time_label<Tz: TimeZone>(at: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let elapsed = now.with_timezone(&Utc) - at;
    let local = at.with_timezone(&now.timezone());
    if elapsed < chrono::Duration::hours(24) {
        local.format("%H:%M").to_string()
    } else if elapsed < chrono::Duration::hours(48) {
        "Yesterday".to_string()
    } else {
        local.format("%d/%m/%Y").to_string()
    }
}

/// Bubble timestamp
pub fn clock_time<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn message_at(id: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: id.to_string(),
            sender_id: "a".to_string(),
            receiver_id: "b".to_string(),
            room_id: None,
            content: "hi".to_string(),
            read: false,
            created_at: at,
        }
    }

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    #[test]
    fn test_buckets_use_viewer_timezone() {
        let now = ist().with_ymd_and_hms(2025, 3, 10, 2, 0, 0).unwrap();
        // 20:00 UTC on the 9th is 01:30 IST on the 10th
        let late = Utc.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        assert_eq!(bucket_for(late, &now), DayBucket::Today);
        assert_eq!(bucket_for(earlier, &now), DayBucket::Yesterday);
        assert_eq!(
            bucket_for(old, &now),
            DayBucket::On(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        );
        assert_eq!(bucket_for(old, &now).to_string(), "March 1, 2025");
    }

    #[test]
    fn test_group_by_day_keeps_order() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
        let messages = vec![
            message_at("1", Utc.with_ymd_and_hms(2025, 3, 8, 9, 0, 0).unwrap()),
            message_at("2", Utc.with_ymd_and_hms(2025, 3, 9, 9, 0, 0).unwrap()),
            message_at("3", Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()),
            message_at("4", Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap()),
        ];

        let groups = group_by_day(&messages, &now);
        let buckets: Vec<String> = groups.iter().map(|g| g.bucket.to_string()).collect();
        assert_eq!(buckets, vec!["March 8, 2025", "Yesterday", "Today"]);
        assert_eq!(groups[2].messages.len(), 2);
    }

    #[test]
    fn test_clock_moving_backwards_only_changes_labels() {
        let messages = vec![message_at(
            "1",
            Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        )];
        let before = Utc.with_ymd_and_hms(2025, 3, 9, 9, 0, 0).unwrap();
        let groups = group_by_day(&messages, &before);
        assert_eq!(
            groups[0].bucket,
            DayBucket::On(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
        );
        assert_eq!(groups[0].messages, messages);
    }

    #[test]
    fn test_time_label() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2025, 3, 10, 7, 5, 0).unwrap();
        let day_ago = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let older = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();

        assert_eq!(time_label(recent, &now), "07:05");
        assert_eq!(time_label(day_ago, &now), "Yesterday");
        assert_eq!(time_label(older, &now), "02/03/2025");
    }
}
