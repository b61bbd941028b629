//! The operator's session: the roster of all conversations plus the one
//! currently open.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use frontdesk_log::{MessageLog, Snapshot, SubscriptionLost};
use frontdesk_shared::{ConversationId, Draft};
use frontdesk_store::Database;

use crate::config::SessionConfig;
use crate::roster::{build_roster, RosterEntry};
use crate::router;
use crate::send::{PendingSend, PendingState, SendCoordinator, SendOutcome};
use crate::session::emit_all;
use crate::unread::ReadWatermark;
use crate::view::ConversationView;

/// Commands the operator UI sends into the session task.
#[derive(Debug, Clone)]
pub enum OperatorCommand {
    /// Open a conversation.  Acknowledges it: the watermark is extended and
    /// persisted, and its unread badge drops to zero.
    Select(ConversationId),
    /// Send a reply into the currently selected conversation.  Ignored when
    /// nothing is selected.
    Send { text: String },
    /// End the session.  In-flight sends still complete against the log.
    Shutdown,
}

/// Events the session task pushes out to the operator UI.
#[derive(Debug, Clone, Serialize)]
pub enum OperatorEvent {
    /// The conversation list changed: grouping, ordering or badges.
    RosterUpdated(Vec<RosterEntry>),
    /// The open conversation's displayed messages changed.
    ConversationUpdated {
        conversation: Option<ConversationId>,
        view: ConversationView,
    },
    /// An append could not be committed.
    SendFailed { message_id: Uuid, reason: String },
}

struct OperatorState {
    config: SessionConfig,
    coordinator: SendCoordinator,
    store: Arc<Mutex<Database>>,
    watermark: ReadWatermark,
    selected: Option<ConversationId>,
    latest: Snapshot,
    pending: Vec<PendingSend>,
}

impl OperatorState {
    fn view(&self) -> ConversationView {
        let committed = router::operator_conversation(&self.latest, self.selected.as_ref());
        let pending: Vec<PendingSend> = match &self.selected {
            Some(selected) => self
                .pending
                .iter()
                .filter(|p| p.conversation == *selected)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        ConversationView::assemble(&committed, &pending)
    }

    fn conversation_event(&self) -> OperatorEvent {
        OperatorEvent::ConversationUpdated {
            conversation: self.selected.clone(),
            view: self.view(),
        }
    }

    fn roster_event(&self) -> OperatorEvent {
        OperatorEvent::RosterUpdated(build_roster(&self.latest, &self.watermark))
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> Vec<OperatorEvent> {
        self.latest = snapshot;
        // Confirmed sends are now in the log; drop the optimistic copies.
        self.pending
            .retain(|p| !self.latest.iter().any(|m| m.id == p.id));

        vec![self.roster_event(), self.conversation_event()]
    }

    fn handle_select(&mut self, conversation: ConversationId) -> Vec<OperatorEvent> {
        self.selected = Some(conversation.clone());

        if self.watermark.mark(conversation.clone()) {
            // Persist best-effort; the in-memory watermark already covers
            // this session either way.
            let persisted = self
                .store
                .lock()
                .map_err(|e| format!("lock poisoned: {e}"))
                .and_then(|db| {
                    db.mark_conversation_read(&conversation)
                        .map_err(|e| e.to_string())
                });
            if let Err(e) = persisted {
                warn!(conversation = %conversation, error = %e, "failed to persist read state");
            }
        }

        vec![self.roster_event(), self.conversation_event()]
    }

    fn handle_send(&mut self, text: &str) -> Vec<OperatorEvent> {
        let Some(selected) = self.selected.clone() else {
            debug!("no conversation selected; ignoring send");
            return Vec::new();
        };

        let draft = Draft::from_operator(
            self.config.operator_name.as_str(),
            self.config.operator_country.clone(),
            selected,
            text,
        );
        let Some(pending) = self.coordinator.dispatch(draft) else {
            return Vec::new();
        };
        self.pending.push(pending);

        vec![self.conversation_event()]
    }

    fn handle_outcome(&mut self, outcome: SendOutcome) -> Vec<OperatorEvent> {
        match outcome.result {
            Ok(_) => Vec::new(),
            Err(e) => {
                if let Some(p) = self
                    .pending
                    .iter_mut()
                    .find(|p| p.id == outcome.message_id)
                {
                    p.state = PendingState::Failed;
                }
                vec![
                    self.conversation_event(),
                    OperatorEvent::SendFailed {
                        message_id: outcome.message_id,
                        reason: e.to_string(),
                    },
                ]
            }
        }
    }
}

/// Spawn the operator session task.
///
/// Loads the read watermark from the local store, then returns channels for
/// sending commands and receiving events.
pub fn spawn_operator_session(
    log: Arc<dyn MessageLog>,
    store: Arc<Mutex<Database>>,
    config: SessionConfig,
) -> anyhow::Result<(mpsc::Sender<OperatorCommand>, mpsc::Receiver<OperatorEvent>)> {
    let watermark = {
        let db = store
            .lock()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;
        ReadWatermark::from_set(db.read_conversations()?)
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel(config.channel_capacity);
    let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
    let (outcome_tx, mut outcome_rx) = mpsc::channel(config.channel_capacity);

    let mut state = OperatorState {
        coordinator: SendCoordinator::new(Arc::clone(&log), outcome_tx),
        config,
        store,
        watermark,
        selected: None,
        latest: Snapshot::default(),
        pending: Vec::new(),
    };

    tokio::spawn(async move {
        let mut snapshots = log.subscribe();

        let initial = snapshots.latest();
        if !emit_all(&event_tx, state.apply_snapshot(initial)).await {
            return;
        }

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    let events = match changed {
                        Ok(()) => {
                            let snapshot = snapshots.latest();
                            state.apply_snapshot(snapshot)
                        }
                        Err(SubscriptionLost) => {
                            warn!("log subscription lost; re-subscribing");
                            snapshots = log.subscribe();
                            if snapshots.is_closed() {
                                error!("log backend gone; ending operator session");
                                break;
                            }
                            let snapshot = snapshots.latest();
                            state.apply_snapshot(snapshot)
                        }
                    };
                    if !emit_all(&event_tx, events).await {
                        break;
                    }
                }

                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let events = match cmd {
                        OperatorCommand::Select(conversation) => {
                            state.handle_select(conversation)
                        }
                        OperatorCommand::Send { text } => state.handle_send(&text),
                        OperatorCommand::Shutdown => break,
                    };
                    if !emit_all(&event_tx, events).await {
                        break;
                    }
                }

                Some(outcome) = outcome_rx.recv() => {
                    if !emit_all(&event_tx, state.handle_outcome(outcome)).await {
                        break;
                    }
                }
            }
        }

        debug!("operator session ended");
    });

    Ok((cmd_tx, event_rx))
}
