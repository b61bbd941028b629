//! Test backends for the session loops.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use frontdesk_log::{error, MessageLog, Snapshot, Snapshots};
use frontdesk_shared::{Draft, Message};

struct SeverableInner {
    entries: Vec<Message>,
    publisher: watch::Sender<Snapshot>,
}

/// A log backend whose live channel can be torn down on demand, so the
/// sessions' loss-and-resubscribe path is reachable from tests.  Appends
/// commit with the raw draft timestamp; ordering is the callers' problem.
pub(crate) struct SeverableLog {
    inner: Mutex<SeverableInner>,
}

impl SeverableLog {
    pub(crate) fn new() -> Self {
        let (publisher, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Mutex::new(SeverableInner {
                entries: Vec::new(),
                publisher,
            }),
        }
    }

    /// Drop the live channel.  Existing subscriptions observe the loss;
    /// later `subscribe` calls land on a fresh channel carrying the
    /// current log.
    pub(crate) fn sever(&self) {
        let mut inner = self.inner.lock().unwrap();
        let (publisher, _) = watch::channel(Arc::new(inner.entries.clone()));
        inner.publisher = publisher;
    }
}

#[async_trait]
impl MessageLog for SeverableLog {
    async fn append(&self, draft: Draft) -> error::Result<Message> {
        let mut inner = self.inner.lock().unwrap();
        let committed = draft.into_message(Utc::now());
        inner.entries.push(committed.clone());
        let snapshot: Snapshot = Arc::new(inner.entries.clone());
        inner.publisher.send_replace(snapshot);
        Ok(committed)
    }

    fn subscribe(&self) -> Snapshots {
        Snapshots::new(self.inner.lock().unwrap().publisher.subscribe())
    }
}
