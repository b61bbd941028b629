//! Conversation routing: which subset of the log a viewer may see.
//!
//! Routing is stateless; the owning conversation id on each message fully
//! determines where it belongs.  Malformed records (no owning conversation,
//! typically an operator message that lost its recipient) are dropped here,
//! at the boundary closest to the bad data, so they can never blank out a
//! conversation or the roster.

use tracing::warn;

use frontdesk_shared::{ConversationId, Message, UserId};

/// Iterate the well-formed messages of a snapshot, logging anything dropped.
pub(crate) fn well_formed(snapshot: &[Message]) -> impl Iterator<Item = &Message> {
    snapshot.iter().filter(|message| {
        if message.is_malformed() {
            warn!(
                message_id = %message.id,
                sender = ?message.sender,
                "dropping message without an owning conversation"
            );
            false
        } else {
            true
        }
    })
}

/// The single conversation a visitor sees: their own sends plus operator
/// replies addressed to them, ascending by authoritative timestamp.
pub fn visitor_conversation(snapshot: &[Message], uid: &UserId) -> Vec<Message> {
    let conversation = ConversationId::for_visitor(uid);
    well_formed(snapshot)
        .filter(|message| message.belongs_to(&conversation))
        .cloned()
        .collect()
}

/// The conversation the operator currently has open.
///
/// With no selection the visible set is empty by policy: the operator must
/// explicitly pick a conversation before seeing any messages.
pub fn operator_conversation(
    snapshot: &[Message],
    selected: Option<&ConversationId>,
) -> Vec<Message> {
    let Some(selected) = selected else {
        return Vec::new();
    };
    well_formed(snapshot)
        .filter(|message| message.belongs_to(selected))
        .cloned()
        .collect()
}
