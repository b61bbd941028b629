//! The message model: drafts on the write path, committed messages on the
//! read path.
//!
//! A [`Draft`] carries the client-side provisional `sent_at` used for
//! optimistic display.  The log backend assigns the authoritative
//! `created_at` at commit time and returns a [`Message`]; only committed
//! messages ever appear in a delivered snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ConversationId, Sender, UserId, VisitorIdentity};

/// True when the text would be rejected by the log (empty or whitespace-only).
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// A message that has not yet been committed to the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    /// Client-assigned id, preserved through commit so the sender can match
    /// the committed message against its optimistic copy.
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    /// Display name at time of send; never re-resolved later.
    pub sender_name: String,
    pub country: Option<String>,
    /// Owning conversation.  `None` only occurs in records a backend
    /// surfaces from elsewhere; the constructors below always set it.
    pub conversation: Option<ConversationId>,
    /// Provisional client-side timestamp, superseded at commit.
    pub sent_at: DateTime<Utc>,
}

impl Draft {
    /// A visitor writing into their own conversation.
    pub fn from_visitor(identity: &VisitorIdentity, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender: Sender::Visitor(identity.uid.clone()),
            sender_name: identity.display_name.clone(),
            country: identity.country.clone(),
            conversation: Some(identity.conversation()),
            sent_at: Utc::now(),
        }
    }

    /// The operator replying into a visitor's conversation.
    pub fn from_operator(
        operator_name: impl Into<String>,
        country: Option<String>,
        recipient: ConversationId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender: Sender::Operator,
            sender_name: operator_name.into(),
            country,
            conversation: Some(recipient),
            sent_at: Utc::now(),
        }
    }

    /// Attach the authoritative timestamp assigned by the log backend.
    pub fn into_message(self, created_at: DateTime<Utc>) -> Message {
        Message {
            id: self.id,
            text: self.text,
            sender: self.sender,
            sender_name: self.sender_name,
            country: self.country,
            conversation: self.conversation,
            created_at,
        }
    }
}

/// A committed, immutable log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub sender_name: String,
    pub country: Option<String>,
    pub conversation: Option<ConversationId>,
    /// Authoritative ordering timestamp, strictly monotonic across the log.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A record the routing layer must drop: no owning conversation means it
    /// can never be shown to any viewer.
    pub fn is_malformed(&self) -> bool {
        self.conversation.is_none()
    }

    /// True when this message belongs to the given conversation.
    pub fn belongs_to(&self, conversation: &ConversationId) -> bool {
        self.conversation.as_ref() == Some(conversation)
    }

    /// The visitor uid of the author, if visitor-authored.
    pub fn visitor_author(&self) -> Option<&UserId> {
        self.sender.visitor_uid()
    }
}
