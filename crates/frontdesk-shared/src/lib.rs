//! # frontdesk-shared
//!
//! Domain types shared by every frontdesk crate: viewer identities, the
//! message model, and workspace-wide constants.
//!
//! Nothing in this crate performs I/O.  The types here are plain data with
//! `serde` derives so they can be handed across an IPC boundary to a UI
//! layer unchanged.

pub mod constants;
pub mod message;
pub mod types;

pub use message::{Draft, Message};
pub use types::{ConversationId, Sender, UserId, VisitorIdentity};
