//! Error types for the UniFi Access client.
//!
//! # Design
//! Each layer returns its failure unchanged: configuration problems surface at
//! construction, transport failures keep the transport's own error as the
//! source, and the envelope decoder separates "the body is not an envelope"
//! (`MalformedResponse`) from "the envelope says the call failed"
//! (`Application`).

use thiserror::Error;

/// Boxed error returned by [`Transport`](crate::Transport) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the client, its builder, and its decoder.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base endpoint or an environment setting is unusable.
    #[error("invalid configuration for {input:?}: {reason}")]
    Config { input: String, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("error encoding request: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The transport failed before a response was available.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a non-200 status under
    /// [`StatusPolicy::RequireOk`](crate::StatusPolicy::RequireOk).
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The body is not JSON, or not shaped like `{code, msg, data}`.
    #[error("error parsing response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The envelope decoded but its code is not `SUCCESS`.
    #[error("{code}: {msg}")]
    Application { code: String, msg: String },
}

impl ApiError {
    pub(crate) fn config(input: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::Config {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is an application error carrying `code`.
    pub fn is_application_code(&self, code: &str) -> bool {
        matches!(self, ApiError::Application { code: c, .. } if c == code)
    }
}
