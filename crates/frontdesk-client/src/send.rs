//! The optimistic write path.
//!
//! A send is reflected locally the moment it is dispatched and committed to
//! the log in the background.  Convergence needs no explicit reconciliation:
//! the committed message keeps the draft's id, so the next full snapshot
//! supersedes the optimistic copy.  Failed appends are surfaced, never
//! retried (policy: no-retry, show the failure).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use frontdesk_log::{LogError, MessageLog};
use frontdesk_shared::{message, ConversationId, Draft, Message, Sender};

/// Whether an unconfirmed send is still in flight or has failed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PendingState {
    InFlight,
    Failed,
}

/// A message dispatched but not yet visible in a committed snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSend {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub sender_name: String,
    pub conversation: ConversationId,
    /// Provisional client-side timestamp used for immediate display.
    pub sent_at: DateTime<Utc>,
    pub state: PendingState,
}

impl PendingSend {
    /// The optimistic mirror of a draft.  `None` if the draft has no owning
    /// conversation, which the coordinator refuses to dispatch.
    pub fn from_draft(draft: &Draft) -> Option<Self> {
        Some(Self {
            id: draft.id,
            text: draft.text.clone(),
            sender: draft.sender.clone(),
            sender_name: draft.sender_name.clone(),
            conversation: draft.conversation.clone()?,
            sent_at: draft.sent_at,
            state: PendingState::InFlight,
        })
    }
}

/// Result of one background append, reported back to the session loop.
#[derive(Debug)]
pub struct SendOutcome {
    pub message_id: Uuid,
    pub result: Result<Message, LogError>,
}

/// Validates drafts and appends them to the log in background tasks.
pub struct SendCoordinator {
    log: Arc<dyn MessageLog>,
    outcome_tx: mpsc::Sender<SendOutcome>,
}

impl SendCoordinator {
    /// `outcome_tx` carries append results back to the owning session loop.
    pub fn new(log: Arc<dyn MessageLog>, outcome_tx: mpsc::Sender<SendOutcome>) -> Self {
        Self { log, outcome_tx }
    }

    /// Dispatch a draft.
    ///
    /// Blank text is a no-op (`None`): nothing is appended and no state
    /// changes, per policy.  Otherwise the returned [`PendingSend`] can be
    /// folded into the sender's local view immediately while the append
    /// runs in the background.
    pub fn dispatch(&self, draft: Draft) -> Option<PendingSend> {
        if message::is_blank(&draft.text) {
            debug!("ignoring blank send");
            return None;
        }

        let Some(pending) = PendingSend::from_draft(&draft) else {
            warn!(message_id = %draft.id, "refusing to dispatch draft without a conversation");
            return None;
        };

        let log = Arc::clone(&self.log);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let message_id = draft.id;
            let result = log.append(draft).await;
            if let Err(e) = &result {
                warn!(message_id = %message_id, error = %e, "append failed");
            }
            // The session may already be gone; nothing left to notify then.
            let _ = outcome_tx.send(SendOutcome { message_id, result }).await;
        });

        Some(pending)
    }
}
