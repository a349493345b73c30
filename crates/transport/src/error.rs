//! Error types for the transport layer.

use std::io;

/// Errors that can occur while framing or unframing messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The header section contained invalid UTF-8.
    #[error("invalid UTF-8 in header")]
    InvalidUtf8,

    /// The Content-Length header value could not be parsed as an integer.
    #[error("malformed Content-Length header value")]
    MalformedContentLength,

    /// No Content-Length header was found in the frame.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// The frame body exceeds the configured maximum size.
    #[error("message size {size} exceeds maximum allowed {max}")]
    MessageTooLarge {
        /// The actual message size.
        size: usize,
        /// The maximum allowed size.
        max: usize,
    },

    /// Failed to deserialize the JSON frame body.
    #[error("JSON deserialization failed: {0}")]
    JsonDeserialize(#[source] serde_json::Error),

    /// Failed to serialize the outgoing message to JSON.
    #[error("JSON serialization failed: {0}")]
    JsonSerialize(#[source] serde_json::Error),
}

/// Errors surfaced by [`crate::Client`] and [`crate::CommandStream`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The frame could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Connecting to the backend failed.
    #[error("connecting to backend: {0}")]
    Connect(#[source] io::Error),

    /// The connection actor has stopped, or the backend hung up before replying.
    #[error("connection to backend closed")]
    Disconnected,

    /// The backend answered with `success: false`.
    #[error("backend rejected {action} request: {message}")]
    Rejected {
        action: &'static str,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("decoding {action} response body: {source}")]
    Body {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
