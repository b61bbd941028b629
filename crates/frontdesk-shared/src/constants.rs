//! Workspace-wide constants.

/// Display name attached to operator-authored messages when the deployment
/// does not configure one.
pub const DEFAULT_OPERATOR_NAME: &str = "Admin";

/// Fallback display name for visitors that never supplied one.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// Default capacity of the session command and event channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
