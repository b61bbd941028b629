//! The visitor's session: one private conversation with the operator.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use frontdesk_log::{MessageLog, SubscriptionLost};
use frontdesk_shared::{Draft, Message, VisitorIdentity};
use frontdesk_store::Database;

use crate::config::SessionConfig;
use crate::router;
use crate::send::{PendingSend, PendingState, SendCoordinator, SendOutcome};
use crate::session::emit_all;
use crate::unread::VisitorUnread;
use crate::view::ConversationView;

/// Commands a visitor UI sends into the session task.
#[derive(Debug, Clone)]
pub enum VisitorCommand {
    /// Send a message into the visitor's own conversation.
    Send { text: String },
    /// The visitor focused the chat; clears the unread badge.
    Focus,
    /// Persist the current conversation to the local store.
    SaveHistory,
    /// End the session.  In-flight sends still complete against the log.
    Shutdown,
}

/// Events the session task pushes out to the visitor UI.
#[derive(Debug, Clone, Serialize)]
pub enum VisitorEvent {
    /// The displayed conversation changed (new snapshot, optimistic send,
    /// or a send failure being marked).
    ConversationUpdated(ConversationView),
    /// The unread badge changed.
    UnreadChanged(u32),
    /// The history-saved indicator changed.
    HistorySaved { saved: bool },
    /// An append could not be committed; the message stays visible as
    /// failed rather than vanishing.
    SendFailed { message_id: Uuid, reason: String },
}

struct VisitorState {
    identity: VisitorIdentity,
    coordinator: SendCoordinator,
    store: Option<Arc<Mutex<Database>>>,
    committed: Vec<Message>,
    pending: Vec<PendingSend>,
    unread: VisitorUnread,
    last_unread: u32,
    saved_len: usize,
    history_saved: bool,
}

impl VisitorState {
    fn view(&self) -> ConversationView {
        ConversationView::assemble(&self.committed, &self.pending)
    }

    fn apply_snapshot(&mut self, snapshot: &[Message]) -> Vec<VisitorEvent> {
        self.committed = router::visitor_conversation(snapshot, &self.identity.uid);
        // Confirmed sends are now in the committed view; drop the
        // optimistic copies.
        self.pending
            .retain(|p| !self.committed.iter().any(|m| m.id == p.id));

        let mut events = vec![VisitorEvent::ConversationUpdated(self.view())];

        let count = self.unread.observe(&self.committed);
        if count != self.last_unread {
            self.last_unread = count;
            events.push(VisitorEvent::UnreadChanged(count));
        }

        if self.history_saved && self.committed.len() > self.saved_len {
            self.history_saved = false;
            events.push(VisitorEvent::HistorySaved { saved: false });
        }

        events
    }

    fn handle_send(&mut self, text: &str) -> Vec<VisitorEvent> {
        let draft = Draft::from_visitor(&self.identity, text);
        let Some(pending) = self.coordinator.dispatch(draft) else {
            return Vec::new();
        };
        self.pending.push(pending);

        // Sending counts as an interaction; the badge resets.
        self.unread.reset();
        let mut events = vec![VisitorEvent::ConversationUpdated(self.view())];
        if self.last_unread != 0 {
            self.last_unread = 0;
            events.push(VisitorEvent::UnreadChanged(0));
        }
        events
    }

    fn handle_focus(&mut self) -> Vec<VisitorEvent> {
        self.unread.reset();
        if self.last_unread != 0 {
            self.last_unread = 0;
            vec![VisitorEvent::UnreadChanged(0)]
        } else {
            Vec::new()
        }
    }

    fn handle_save(&mut self) -> Vec<VisitorEvent> {
        let Some(store) = &self.store else {
            warn!("no local store configured; cannot save history");
            return Vec::new();
        };

        let conversation = self.identity.conversation();
        let result = store
            .lock()
            .map_err(|e| format!("lock poisoned: {e}"))
            .and_then(|db| {
                db.save_transcript(&conversation, &self.committed)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(saved) => {
                debug!(conversation = %conversation, saved, "history saved");
                self.saved_len = self.committed.len();
                self.history_saved = true;
                vec![VisitorEvent::HistorySaved { saved: true }]
            }
            Err(e) => {
                warn!(error = %e, "failed to save history");
                Vec::new()
            }
        }
    }

    fn handle_outcome(&mut self, outcome: SendOutcome) -> Vec<VisitorEvent> {
        match outcome.result {
            // The committed message arrives with the next snapshot; nothing
            // to reconcile here.
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
                    VisitorEvent::ConversationUpdated(self.view()),
                    VisitorEvent::SendFailed {
                        message_id: outcome.message_id,
                        reason: e.to_string(),
                    },
                ]
            }
        }
    }
}

/// Spawn a visitor session task.
///
/// Returns channels for sending commands and receiving events.  The store
/// is optional: without one, `SaveHistory` is a logged no-op.
pub fn spawn_visitor_session(
    log: Arc<dyn MessageLog>,
    store: Option<Arc<Mutex<Database>>>,
    identity: VisitorIdentity,
    config: SessionConfig,
) -> (mpsc::Sender<VisitorCommand>, mpsc::Receiver<VisitorEvent>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel(config.channel_capacity);
    let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
    let (outcome_tx, mut outcome_rx) = mpsc::channel(config.channel_capacity);

    let mut state = VisitorState {
        coordinator: SendCoordinator::new(Arc::clone(&log), outcome_tx),
        identity,
        store,
        committed: Vec::new(),
        pending: Vec::new(),
        unread: VisitorUnread::new(),
        last_unread: 0,
        saved_len: 0,
        history_saved: false,
    };

    tokio::spawn(async move {
        let mut snapshots = log.subscribe();

        // Registration delivers the current snapshot immediately.
        let initial = snapshots.latest();
        if !emit_all(&event_tx, state.apply_snapshot(&initial)).await {
            return;
        }

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    let events = match changed {
                        Ok(()) => {
                            let snapshot = snapshots.latest();
                            state.apply_snapshot(&snapshot)
                        }
                        Err(SubscriptionLost) => {
                            warn!("log subscription lost; re-subscribing");
                            snapshots = log.subscribe();
                            if snapshots.is_closed() {
                                error!("log backend gone; ending visitor session");
                                break;
                            }
                            let snapshot = snapshots.latest();
                            state.apply_snapshot(&snapshot)
                        }
                    };
                    if !emit_all(&event_tx, events).await {
                        break;
                    }
                }

                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let events = match cmd {
                        VisitorCommand::Send { text } => state.handle_send(&text),
                        VisitorCommand::Focus => state.handle_focus(),
                        VisitorCommand::SaveHistory => state.handle_save(),
                        VisitorCommand::Shutdown => break,
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

        debug!(uid = %state.identity.uid, "visitor session ended");
    });

    (cmd_tx, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Delivery;
    use frontdesk_log::MemoryLog;
    use frontdesk_shared::ConversationId;
    use std::time::Duration;

    async fn wait_for<F>(rx: &mut mpsc::Receiver<VisitorEvent>, mut pred: F) -> VisitorEvent
    where
        F: FnMut(&VisitorEvent) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let event = rx.recv().await.expect("session ended unexpectedly");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    fn mina() -> VisitorIdentity {
        VisitorIdentity::new("u1", "Mina").with_country("KR")
    }

    #[tokio::test]
    async fn optimistic_send_converges_without_duplicates() {
        let log = Arc::new(MemoryLog::new());
        let (cmds, mut events) =
            spawn_visitor_session(log.clone(), None, mina(), SessionConfig::default());

        // Registration snapshot.
        let first = events.recv().await.unwrap();
        assert!(matches!(
            &first,
            VisitorEvent::ConversationUpdated(v) if v.is_empty()
        ));

        cmds.send(VisitorCommand::Send { text: "hello".into() })
            .await
            .unwrap();

        // Optimistic delivery first.
        let pending = wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::ConversationUpdated(v) if !v.is_empty())
        })
        .await;
        if let VisitorEvent::ConversationUpdated(view) = &pending {
            assert_eq!(view.len(), 1);
            assert_eq!(view.messages[0].delivery, Delivery::Pending);
        }

        // Then the authoritative snapshot supersedes it, same length.
        wait_for(&mut events, |e| {
            matches!(
                e,
                VisitorEvent::ConversationUpdated(v)
                    if v.len() == 1 && v.messages[0].delivery == Delivery::Committed
            )
        })
        .await;
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn whitespace_send_changes_nothing() {
        let log = Arc::new(MemoryLog::new());
        let (cmds, mut events) =
            spawn_visitor_session(log.clone(), None, mina(), SessionConfig::default());
        events.recv().await.unwrap();

        cmds.send(VisitorCommand::Send { text: "   ".into() })
            .await
            .unwrap();
        cmds.send(VisitorCommand::Send { text: "real".into() })
            .await
            .unwrap();

        // The first view update comes from the real send only.
        let event = wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::ConversationUpdated(v) if !v.is_empty())
        })
        .await;
        if let VisitorEvent::ConversationUpdated(view) = event {
            assert_eq!(view.len(), 1);
            assert_eq!(view.messages[0].text, "real");
        }
    }

    #[tokio::test]
    async fn operator_replies_raise_the_badge_and_focus_clears_it() {
        let log = Arc::new(MemoryLog::new());
        let (cmds, mut events) =
            spawn_visitor_session(log.clone(), None, mina(), SessionConfig::default());
        events.recv().await.unwrap();

        log.append(Draft::from_operator(
            "Admin",
            None,
            ConversationId("u1".into()),
            "hello Mina",
        ))
        .await
        .unwrap();

        wait_for(&mut events, |e| matches!(e, VisitorEvent::UnreadChanged(1))).await;

        cmds.send(VisitorCommand::Focus).await.unwrap();
        wait_for(&mut events, |e| matches!(e, VisitorEvent::UnreadChanged(0))).await;
    }

    #[tokio::test]
    async fn failed_send_is_surfaced_not_dropped() {
        let log = Arc::new(MemoryLog::new());
        log.close();
        let (cmds, mut events) =
            spawn_visitor_session(log.clone(), None, mina(), SessionConfig::default());
        events.recv().await.unwrap();

        cmds.send(VisitorCommand::Send { text: "hello".into() })
            .await
            .unwrap();

        // The message stays displayed, marked failed, and the failure is
        // reported.
        let event = wait_for(&mut events, |e| {
            matches!(
                e,
                VisitorEvent::ConversationUpdated(v)
                    if v.len() == 1 && v.messages[0].delivery == Delivery::Failed
            )
        })
        .await;
        if let VisitorEvent::ConversationUpdated(view) = event {
            assert_eq!(view.messages[0].text, "hello");
        }
        wait_for(&mut events, |e| matches!(e, VisitorEvent::SendFailed { .. })).await;
    }

    #[tokio::test]
    async fn lost_subscription_is_reestablished_with_the_current_view() {
        let log = Arc::new(crate::session::testing::SeverableLog::new());
        let (_cmds, mut events) =
            spawn_visitor_session(log.clone(), None, mina(), SessionConfig::default());
        events.recv().await.unwrap();

        log.append(Draft::from_visitor(&mina(), "before the drop"))
            .await
            .unwrap();
        wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::ConversationUpdated(v) if v.len() == 1)
        })
        .await;

        // Tearing down the live channel must not empty the view: recovery
        // re-emits the last known conversation.
        log.sever();
        wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::ConversationUpdated(v) if v.len() == 1)
        })
        .await;

        // And the replacement subscription delivers new messages.
        log.append(Draft::from_visitor(&mina(), "after the drop"))
            .await
            .unwrap();
        wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::ConversationUpdated(v) if v.len() == 2)
        })
        .await;
    }

    #[tokio::test]
    async fn saved_history_goes_stale_on_new_messages() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let store = Arc::new(Mutex::new(db));

        let log = Arc::new(MemoryLog::new());
        let (cmds, mut events) = spawn_visitor_session(
            log.clone(),
            Some(store.clone()),
            mina(),
            SessionConfig::default(),
        );
        events.recv().await.unwrap();

        log.append(Draft::from_visitor(&mina(), "first")).await.unwrap();
        wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::ConversationUpdated(v) if v.len() == 1)
        })
        .await;

        cmds.send(VisitorCommand::SaveHistory).await.unwrap();
        wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::HistorySaved { saved: true })
        })
        .await;
        {
            let db = store.lock().unwrap();
            assert_eq!(db.transcript_len(&ConversationId("u1".into())).unwrap(), 1);
        }

        log.append(Draft::from_operator(
            "Admin",
            None,
            ConversationId("u1".into()),
            "reply",
        ))
        .await
        .unwrap();
        wait_for(&mut events, |e| {
            matches!(e, VisitorEvent::HistorySaved { saved: false })
        })
        .await;
    }
}
