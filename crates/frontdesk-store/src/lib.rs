//! # frontdesk-store
//!
//! Per-device local state for a viewer session, backed by SQLite.
//!
//! Nothing in here is shared between devices or written back to the message
//! log: the store holds exactly two things a single viewer owns outright —
//! the operator's read watermark (which conversations have been
//! acknowledged) and locally saved conversation transcripts.

pub mod database;
pub mod migrations;
pub mod read_state;
pub mod transcripts;

mod error;

pub use database::Database;
pub use error::StoreError;
