//! In-process reference backend.
//!
//! `MemoryLog` keeps the whole log in memory and fans out full snapshots
//! over a `tokio::sync::watch` channel.  It is the backend the test suites
//! run on, and the executable definition of the [`MessageLog`] contract.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tracing::debug;

use frontdesk_shared::{message, Draft, Message};

use crate::error::{LogError, Result};
use crate::log::MessageLog;
use crate::subscription::{Snapshot, Snapshots};

struct Inner {
    entries: Vec<Message>,
    last_commit: Option<DateTime<Utc>>,
    closed: bool,
}

/// An in-memory, append-only message log.
pub struct MemoryLog {
    inner: Mutex<Inner>,
    publisher: watch::Sender<Snapshot>,
}

impl MemoryLog {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                last_commit: None,
                closed: false,
            }),
            publisher,
        }
    }

    /// Mark the backend unreachable.  Further appends fail with
    /// [`LogError::Closed`]; existing subscriptions keep their last snapshot.
    pub fn close(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.closed = true;
        }
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| LogError::Backend(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageLog for MemoryLog {
    async fn append(&self, draft: Draft) -> Result<Message> {
        if message::is_blank(&draft.text) {
            return Err(LogError::BlankText);
        }

        let committed = {
            let mut inner = self.lock()?;
            if inner.closed {
                return Err(LogError::Closed);
            }

            // Authoritative timestamp: wall clock, bumped past the previous
            // commit so the total order stays strict even when the clock
            // stalls or steps backwards.
            let mut created_at = Utc::now();
            if let Some(last) = inner.last_commit {
                if created_at <= last {
                    created_at = last + Duration::milliseconds(1);
                }
            }
            inner.last_commit = Some(created_at);

            let committed = draft.into_message(created_at);
            inner.entries.push(committed.clone());

            // Publish under the commit lock: snapshot order must match
            // commit order, or a snapshot missing the latest entry could
            // overwrite one that has it.
            let snapshot: Snapshot = Arc::new(inner.entries.clone());
            self.publisher.send_replace(snapshot);
            committed
        };

        debug!(
            message_id = %committed.id,
            conversation = ?committed.conversation,
            "committed message"
        );
        Ok(committed)
    }

    fn subscribe(&self) -> Snapshots {
        Snapshots::new(self.publisher.subscribe())
    }
}
