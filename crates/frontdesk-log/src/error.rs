use thiserror::Error;

/// Errors produced by the log layer.
#[derive(Error, Debug)]
pub enum LogError {
    /// Empty or whitespace-only text is rejected before any write.
    #[error("Message text is blank")]
    BlankText,

    /// The backend is closed or unreachable; the append did not commit.
    #[error("Log backend is unavailable")]
    Closed,

    /// Backend-specific failure.
    #[error("Log backend error: {0}")]
    Backend(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LogError>;
