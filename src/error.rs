//! Request-level error taxonomy.
//!
//! `NodeUnreachable` is recovered inside the forwarding loop and never
//! surfaces to the client unless it escalates to `BackendExhausted`.
//! The access variants surface immediately, before any backend attempt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    /// The authorization collaborator refused the identity.
    #[error("access denied")]
    AccessDenied,

    /// No anonymous eligibility and no valid credentials; the client
    /// must authenticate.
    #[error("authentication required")]
    AuthenticationRequired,

    /// A single forward attempt failed (connect failure or timeout).
    /// Handled by retrying the next candidate node.
    #[error("node {node} unreachable: {reason}")]
    NodeUnreachable { node: String, reason: String },

    /// Every candidate node failed. Fatal for this request only.
    #[error("all backend nodes exhausted")]
    BackendExhausted,

    /// The request body exceeded the replay buffer limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
}
