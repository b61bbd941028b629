//! The operator's roster: one summary entry per active conversation.
//!
//! Rebuilt wholesale on every snapshot.  Only visitor-authored messages
//! define a conversation's roster presence and recency, so a conversation
//! containing nothing but operator messages is not listable, and the
//! operator's own identity can never appear (it has no visitor uid).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use frontdesk_shared::constants::UNKNOWN_DISPLAY_NAME;
use frontdesk_shared::{ConversationId, Message};

use crate::router;
use crate::unread::{operator_unread, ReadWatermark};

/// One line in the operator's conversation list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub conversation: ConversationId,
    /// Display name from the most recent visitor message (denormalized
    /// metadata always reflects the latest known value).
    pub display_name: String,
    pub country: Option<String>,
    /// Authoritative timestamp of the most recent visitor message.
    pub last_message_at: DateTime<Utc>,
    pub unread: u32,
}

/// Build the roster for a snapshot: grouped by conversation, annotated with
/// unread counts, most recently active first.  Ties keep first-seen
/// snapshot order.
pub fn build_roster(snapshot: &[Message], watermark: &ReadWatermark) -> Vec<RosterEntry> {
    let unread = operator_unread(snapshot, watermark);

    let mut entries: Vec<RosterEntry> = Vec::new();
    let mut index: HashMap<ConversationId, usize> = HashMap::new();

    for message in router::well_formed(snapshot) {
        if message.sender.is_operator() {
            continue;
        }
        let Some(conversation) = message.conversation.clone() else {
            continue;
        };

        let display_name = if message.sender_name.is_empty() {
            UNKNOWN_DISPLAY_NAME.to_string()
        } else {
            message.sender_name.clone()
        };

        match index.get(&conversation) {
            Some(&i) => {
                let entry = &mut entries[i];
                if message.created_at >= entry.last_message_at {
                    entry.last_message_at = message.created_at;
                    entry.display_name = display_name;
                    entry.country = message.country.clone();
                }
            }
            None => {
                index.insert(conversation.clone(), entries.len());
                entries.push(RosterEntry {
                    unread: unread.get(&conversation).copied().unwrap_or(0),
                    conversation,
                    display_name,
                    country: message.country.clone(),
                    last_message_at: message.created_at,
                });
            }
        }
    }

    // Stable sort: ties stay in first-seen order.
    entries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use frontdesk_shared::{Draft, Sender, UserId, VisitorIdentity};
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn visitor_msg(uid: &str, name: &str, text: &str, secs: i64) -> Message {
        Draft::from_visitor(&VisitorIdentity::new(uid, name), text).into_message(at(secs))
    }

    fn operator_msg(to: &str, text: &str, secs: i64) -> Message {
        Draft::from_operator("Admin", None, ConversationId(to.into()), text).into_message(at(secs))
    }

    #[test]
    fn ordered_most_recent_first() {
        let snapshot = vec![
            visitor_msg("a", "A", "m", 10),
            visitor_msg("c", "C", "m", 20),
            visitor_msg("b", "B", "m", 30),
        ];

        let roster = build_roster(&snapshot, &ReadWatermark::new());
        let order: Vec<&str> = roster.iter().map(|e| e.conversation.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn metadata_comes_from_the_most_recent_visitor_message() {
        let mut old = visitor_msg("u1", "Mina", "first", 10);
        old.country = Some("KR".into());
        let mut new = visitor_msg("u1", "Mina Park", "second", 20);
        new.country = Some("JP".into());

        let roster = build_roster(&[old, new], &ReadWatermark::new());
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].display_name, "Mina Park");
        assert_eq!(roster[0].country.as_deref(), Some("JP"));
        assert_eq!(roster[0].last_message_at, at(20));
        assert_eq!(roster[0].unread, 2);
    }

    #[test]
    fn operator_only_conversations_are_not_listable() {
        let snapshot = vec![
            operator_msg("u1", "are you there?", 10),
            visitor_msg("u2", "Joon", "hi", 20),
        ];

        let roster = build_roster(&snapshot, &ReadWatermark::new());
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].conversation.as_str(), "u2");
    }

    #[test]
    fn operator_replies_do_not_bump_recency_or_unread() {
        let snapshot = vec![
            visitor_msg("u1", "Mina", "hi", 10),
            operator_msg("u1", "hello!", 50),
        ];

        let roster = build_roster(&snapshot, &ReadWatermark::new());
        assert_eq!(roster[0].last_message_at, at(10));
        assert_eq!(roster[0].unread, 1);
    }

    #[test]
    fn acknowledged_conversation_shows_zero_unread() {
        let snapshot = vec![
            visitor_msg("u1", "Mina", "hi", 10),
            visitor_msg("u2", "Joon", "hey", 20),
        ];

        let mut watermark = ReadWatermark::new();
        watermark.mark(ConversationId("u1".into()));

        let roster = build_roster(&snapshot, &watermark);
        let u1 = roster.iter().find(|e| e.conversation.as_str() == "u1").unwrap();
        let u2 = roster.iter().find(|e| e.conversation.as_str() == "u2").unwrap();
        assert_eq!(u1.unread, 0);
        assert_eq!(u2.unread, 1);
    }

    #[test]
    fn ties_keep_first_seen_order_and_rebuild_is_deterministic() {
        let snapshot = vec![
            visitor_msg("u1", "Mina", "hi", 10),
            visitor_msg("u2", "Joon", "hey", 10),
        ];

        let roster = build_roster(&snapshot, &ReadWatermark::new());
        let order: Vec<&str> = roster.iter().map(|e| e.conversation.as_str()).collect();
        assert_eq!(order, vec!["u1", "u2"]);
        assert_eq!(roster, build_roster(&snapshot, &ReadWatermark::new()));
    }

    #[test]
    fn nameless_visitors_fall_back_to_unknown() {
        let message = Message {
            id: Uuid::new_v4(),
            text: "hi".into(),
            sender: Sender::Visitor(UserId::new("u1")),
            sender_name: String::new(),
            country: None,
            conversation: Some(ConversationId("u1".into())),
            created_at: at(10),
        };

        let roster = build_roster(&[message], &ReadWatermark::new());
        assert_eq!(roster[0].display_name, "Unknown");
    }
}
