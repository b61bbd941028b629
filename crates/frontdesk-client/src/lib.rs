//! # frontdesk-client
//!
//! Viewer-side state derivation for the frontdesk support chat.
//!
//! Every view in the system is a projection of the shared message log:
//! [`router`] selects the messages a viewer may see, [`unread`] derives
//! unread badges, [`roster`] builds the operator's conversation list, and
//! [`send`] handles the optimistic write path.  The [`session`] module ties
//! these together into long-lived tasks driven by typed command/event
//! channels, one per connected viewer.

pub mod config;
pub mod roster;
pub mod router;
pub mod send;
pub mod session;
pub mod unread;
pub mod view;

pub use config::SessionConfig;
pub use roster::{build_roster, RosterEntry};
pub use send::{PendingSend, PendingState, SendCoordinator, SendOutcome};
pub use session::operator::{spawn_operator_session, OperatorCommand, OperatorEvent};
pub use session::visitor::{spawn_visitor_session, VisitorCommand, VisitorEvent};
pub use unread::{operator_unread, ReadWatermark, VisitorUnread};
pub use view::{ConversationView, Delivery, ViewMessage};

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the tracing subscriber for a frontdesk process.
///
/// Honours `RUST_LOG` when set; otherwise defaults to debug output for the
/// frontdesk crates and warnings for everything else.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("frontdesk_client=debug,frontdesk_log=debug,frontdesk_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
