//! The abstract log contract.

use async_trait::async_trait;

use frontdesk_shared::{Draft, Message};

use crate::error::Result;
use crate::subscription::Snapshots;

/// An ordered, append-only, subscribable message store.
///
/// Contract, in addition to the method docs:
///
/// - Appends are serialized; every successful append receives an
///   authoritative `created_at` strictly greater than all previously
///   committed ones, so all viewers converge on one total order.
/// - Entries are never updated or deleted.
/// - Every successful append eventually publishes a new full snapshot to
///   every live subscription.
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Validate and commit a draft, assigning the authoritative timestamp.
    ///
    /// Fails with [`LogError::BlankText`](crate::LogError::BlankText) before
    /// any write when the text is empty or whitespace-only, and with
    /// [`LogError::Closed`](crate::LogError::Closed) when the backend is
    /// unreachable.  Failures must be surfaced to the sender, never
    /// swallowed.
    async fn append(&self, draft: Draft) -> Result<Message>;

    /// Register a live subscription.  The current snapshot is available on
    /// the returned handle immediately.
    fn subscribe(&self) -> Snapshots;
}
