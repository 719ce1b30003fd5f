//! Error taxonomy for a single interaction.

use thiserror::Error;

/// Malformed local input, resolved before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadRequest {
    /// A command that needs an argument was typed without one.
    #[error("/{command} needs an argument")]
    MissingArgument { command: &'static str },

    /// A callback token whose namespace needs a payload arrived without one.
    #[error("malformed callback token: {0}")]
    MalformedToken(String),

    /// The gateway was asked for a project lookup with an empty identifier.
    #[error("empty project identifier")]
    EmptyIdentifier,
}

/// Everything that can go wrong while resolving an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("bad request: {0}")]
    BadRequest(#[from] BadRequest),

    /// Upstream reported the resource as missing (HTTP 404).
    #[error("not found upstream")]
    NotFound,

    /// Any other non-2xx status, or a 2xx body that could not be decoded.
    #[error("upstream error (status: {status:?})")]
    Upstream { status: Option<u16> },

    #[error("upstream request timed out")]
    Timeout,

    /// Connection-level failure reaching the backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The chat platform rejected an outgoing render.
    #[error("render failed: {0}")]
    RenderFailure(String),
}

impl ErrorKind {
    /// Classify a `reqwest` failure without leaking it upward.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ErrorKind::Timeout
        } else if let Some(status) = err.status() {
            ErrorKind::Upstream {
                status: Some(status.as_u16()),
            }
        } else {
            ErrorKind::Transport(err.to_string())
        }
    }
}
