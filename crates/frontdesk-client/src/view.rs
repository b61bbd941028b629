//! The conversation view handed to a presentation layer.
//!
//! Committed messages come straight from the routed snapshot; the sender's
//! own unconfirmed sends are appended after them with their provisional
//! timestamps.  A pending entry whose id already appears in the snapshot
//! has been confirmed and is dropped, so a message is never shown twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use frontdesk_shared::{Message, Sender};

use crate::send::{PendingSend, PendingState};

/// Delivery status of a displayed message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Committed,
    Pending,
    Failed,
}

/// One displayed message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub sender_name: String,
    /// Authoritative timestamp for committed messages, the provisional
    /// client timestamp otherwise.
    pub timestamp: DateTime<Utc>,
    pub delivery: Delivery,
}

impl ViewMessage {
    fn committed(message: &Message) -> Self {
        Self {
            id: message.id,
            text: message.text.clone(),
            sender: message.sender.clone(),
            sender_name: message.sender_name.clone(),
            timestamp: message.created_at,
            delivery: Delivery::Committed,
        }
    }

    fn pending(send: &PendingSend) -> Self {
        Self {
            id: send.id,
            text: send.text.clone(),
            sender: send.sender.clone(),
            sender_name: send.sender_name.clone(),
            timestamp: send.sent_at,
            delivery: match send.state {
                PendingState::InFlight => Delivery::Pending,
                PendingState::Failed => Delivery::Failed,
            },
        }
    }
}

/// A full conversation as displayed to one viewer.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ConversationView {
    pub messages: Vec<ViewMessage>,
}

impl ConversationView {
    /// Merge routed committed messages with the viewer's own pending sends.
    pub fn assemble(committed: &[Message], pending: &[PendingSend]) -> Self {
        let confirmed: HashSet<Uuid> = committed.iter().map(|m| m.id).collect();

        let mut messages: Vec<ViewMessage> =
            committed.iter().map(ViewMessage::committed).collect();
        messages.extend(
            pending
                .iter()
                .filter(|p| !confirmed.contains(&p.id))
                .map(ViewMessage::pending),
        );

        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use frontdesk_shared::{Draft, VisitorIdentity};

    #[test]
    fn confirmed_pending_entries_are_not_duplicated() {
        let mina = VisitorIdentity::new("u1", "Mina");
        let draft = Draft::from_visitor(&mina, "hello");
        let pending = PendingSend::from_draft(&draft).unwrap();

        // Before confirmation: one pending entry.
        let view = ConversationView::assemble(&[], &[pending.clone()]);
        assert_eq!(view.len(), 1);
        assert_eq!(view.messages[0].delivery, Delivery::Pending);

        // After confirmation the committed copy supersedes the pending one.
        let committed = draft.into_message(Utc::now());
        let view = ConversationView::assemble(&[committed], &[pending]);
        assert_eq!(view.len(), 1);
        assert_eq!(view.messages[0].delivery, Delivery::Committed);
    }
}
