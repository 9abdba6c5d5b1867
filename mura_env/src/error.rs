//! Error types for the MÜRA environment abstraction.

use thiserror::Error;

/// Errors raised by event sources and the clock context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// The upstream subscription reported a connection error.
    ///
    /// Retrying is the subscription's business, not the viewer's.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// The delivery channel was closed from the other side.
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Operation timed out
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl EnvError {
    /// Creates a source-unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Creates a channel-closed error.
    pub fn closed(label: impl std::fmt::Display) -> Self {
        Self::ChannelClosed(label.to_string())
    }
}

/// Reasons a share link does not name a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("link has no `id` parameter")]
    MissingId,

    #[error("link has an empty `id` parameter")]
    EmptyId,

    #[error("malformed percent-encoding in `id`")]
    MalformedEncoding,
}
