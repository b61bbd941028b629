//! Long-lived viewer sessions.
//!
//! Each session runs in a dedicated tokio task driven by exactly two event
//! sources: log snapshot deliveries and viewer commands.  External code
//! talks to the task through typed command and event channels, keeping all
//! session state single-threaded.

pub mod operator;
pub mod visitor;

#[cfg(test)]
pub(crate) mod testing;

use tokio::sync::mpsc;
use tracing::debug;

/// Forward a batch of events to the presentation layer.  Returns `false`
/// when the receiver is gone, which ends the session.
pub(crate) async fn emit_all<T>(tx: &mpsc::Sender<T>, events: Vec<T>) -> bool {
    for event in events {
        if tx.send(event).await.is_err() {
            debug!("event receiver dropped; ending session");
            return false;
        }
    }
    true
}
