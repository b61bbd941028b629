//! Session configuration loaded from environment variables.
//!
//! All settings have sensible defaults so a session can start with zero
//! configuration for local development.

use frontdesk_shared::constants::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_OPERATOR_NAME};

/// Configuration shared by visitor and operator sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Display name attached to operator-authored messages.
    /// Env: `FRONTDESK_OPERATOR_NAME`
    /// Default: `"Admin"`
    pub operator_name: String,

    /// Optional country metadata attached to operator-authored messages.
    /// Env: `FRONTDESK_OPERATOR_COUNTRY`
    /// Default: unset.
    pub operator_country: Option<String>,

    /// Capacity of the session command and event channels.
    /// Env: `FRONTDESK_CHANNEL_CAPACITY`
    /// Default: `64`
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            operator_name: DEFAULT_OPERATOR_NAME.to_string(),
            operator_country: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("FRONTDESK_OPERATOR_NAME") {
            if !name.is_empty() {
                config.operator_name = name;
            }
        }

        if let Ok(country) = std::env::var("FRONTDESK_OPERATOR_COUNTRY") {
            if !country.is_empty() {
                config.operator_country = Some(country);
            }
        }

        if let Ok(val) = std::env::var("FRONTDESK_CHANNEL_CAPACITY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.channel_capacity = n,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid FRONTDESK_CHANNEL_CAPACITY, using default"
                    );
                }
            }
        }

        config
    }
}
