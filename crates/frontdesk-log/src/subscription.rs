//! Live subscription handles.
//!
//! Deliveries are whole replacement snapshots, not diffs: a subscriber that
//! falls behind simply observes the latest state the next time it polls,
//! which is exactly `tokio::sync::watch` semantics.  There is no buffering
//! or backpressure to manage.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use frontdesk_shared::Message;

/// The complete ordered set of committed messages at one point in time,
/// ascending by authoritative timestamp.  Cheap to clone and share.
pub type Snapshot = Arc<Vec<Message>>;

/// The live notification channel dropped.  The viewer's last snapshot stays
/// valid (stale, not empty); the session layer re-subscribes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Log subscription lost")]
pub struct SubscriptionLost;

/// One viewer's registration on the log.
///
/// The current snapshot is available immediately on registration via
/// [`Snapshots::latest`].  Dropping the handle cancels the registration
/// without affecting other subscribers or the log itself.
#[derive(Debug)]
pub struct Snapshots {
    rx: watch::Receiver<Snapshot>,
}

impl Snapshots {
    /// Wrap a raw watch receiver.  Backends call this from their
    /// [`subscribe`](crate::log::MessageLog::subscribe) implementations.
    pub fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self { rx }
    }

    /// The most recently published snapshot, marking it as seen.
    pub fn latest(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Wait until a snapshot newer than the last [`Snapshots::latest`] call
    /// has been published.
    pub async fn changed(&mut self) -> Result<(), SubscriptionLost> {
        self.rx.changed().await.map_err(|_| SubscriptionLost)
    }

    /// Wait for the next snapshot and return it.
    pub async fn next(&mut self) -> Result<Snapshot, SubscriptionLost> {
        self.changed().await?;
        Ok(self.latest())
    }

    /// True when the publishing side is gone and no further deliveries can
    /// arrive.
    pub fn is_closed(&self) -> bool {
        self.rx.has_changed().is_err()
    }
}
