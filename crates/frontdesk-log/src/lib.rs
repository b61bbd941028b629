//! # frontdesk-log
//!
//! The shared message log: an abstract ordered, append-only, subscribable
//! store.  This is the single source of truth for every conversation; all
//! viewer state is derived from the snapshots it publishes.
//!
//! The [`MessageLog`] trait is what the client layer programs against.  The
//! in-process [`MemoryLog`] is the reference backend and is also what the
//! test suites run on; a remote backend only has to honour the same
//! contract: validated appends, strictly monotonic authoritative
//! timestamps, and full-snapshot fan-out to every live subscription.

pub mod error;
pub mod log;
pub mod memory;
pub mod subscription;

pub use error::LogError;
pub use log::MessageLog;
pub use memory::MemoryLog;
pub use subscription::{Snapshot, Snapshots, SubscriptionLost};
