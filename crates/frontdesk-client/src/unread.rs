//! Unread-message derivation for both viewer roles.
//!
//! Counts are always recomputed from the delivered snapshot plus locally
//! owned read state; there is no accumulator that can drift from the log
//! across reconnects or missed deliveries.

use std::collections::{HashMap, HashSet};

use frontdesk_shared::{ConversationId, Message};

use crate::router;

/// The operator's local record of acknowledged conversations.
///
/// Owned by one device, never written back to the shared log.
#[derive(Debug, Clone, Default)]
pub struct ReadWatermark {
    set: HashSet<ConversationId>,
}

impl ReadWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_set(set: HashSet<ConversationId>) -> Self {
        Self { set }
    }

    pub fn contains(&self, conversation: &ConversationId) -> bool {
        self.set.contains(conversation)
    }

    /// Acknowledge a conversation.  Returns `true` when it was newly added.
    pub fn mark(&mut self, conversation: ConversationId) -> bool {
        self.set.insert(conversation)
    }
}

/// Unread state for a visitor's single conversation.
///
/// A visitor's badge counts operator replies that arrived since their last
/// interaction (sending or focusing the conversation).  Because deliveries
/// are whole snapshots, newly arrived replies are found by anchoring on the
/// text of the last operator message already seen; everything after the
/// anchor is new.
#[derive(Debug, Clone, Default)]
pub struct VisitorUnread {
    count: u32,
    last_seen_text: Option<String>,
}

impl VisitorUnread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a freshly delivered conversation into the badge and return the
    /// updated count.  Observing the same snapshot twice adds nothing.
    pub fn observe(&mut self, conversation: &[Message]) -> u32 {
        let replies: Vec<&Message> = conversation
            .iter()
            .filter(|m| m.sender.is_operator())
            .collect();

        let anchor = match &self.last_seen_text {
            Some(text) => replies
                .iter()
                .rposition(|m| m.text == *text)
                .map(|i| i + 1)
                .unwrap_or(0),
            None => 0,
        };

        let new = &replies[anchor..];
        if let Some(latest) = new.last() {
            self.count += new.len() as u32;
            self.last_seen_text = Some(latest.text.clone());
        }
        self.count
    }

    /// Zero the badge (the visitor sent a message or focused the chat).
    /// The dedup anchor is kept so old replies are not re-counted.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Per-conversation unread counts for the operator: visitor-authored
/// messages in conversations not yet covered by the watermark.
///
/// Pure function of `(snapshot, watermark)`; acknowledged conversations are
/// simply absent (count zero), and acknowledging one conversation never
/// changes another's count.
pub fn operator_unread(
    snapshot: &[Message],
    watermark: &ReadWatermark,
) -> HashMap<ConversationId, u32> {
    let mut counts = HashMap::new();
    for message in router::well_formed(snapshot) {
        if message.sender.is_operator() {
            continue;
        }
        let Some(conversation) = &message.conversation else {
            continue;
        };
        if !watermark.contains(conversation) {
            *counts.entry(conversation.clone()).or_insert(0) += 1;
        }
    }
    counts
}
