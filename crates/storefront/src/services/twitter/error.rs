//! Twitter-related errors.

use thiserror::Error;

/// Errors that can occur when talking to the Twitter API.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// HTTP request failed before a response arrived.
    #[error("Twitter request failed: {0}")]
    Request(String),

    /// Failed to read or parse the response body.
    #[error("Twitter response error: {0}")]
    Response(String),

    /// Twitter answered with a non-success status.
    #[error("Twitter API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Request signing failed.
    #[error("OAuth signing error: {0}")]
    Signing(String),

    /// OAuth 2.0 callback did not match the flow stored in the session.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// Twitter is not configured for this deployment.
    #[error("Twitter is not configured")]
    NotConfigured,
}
