//! Error types for the client contract.

use thiserror::Error;

/// Errors raised by a topology query or client connection.
///
/// During readiness polling these are transient: a freshly started server
/// accepts connections before its cluster protocol has converged. After the
/// environment is ready they surface from whatever client call hit them.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server is not accepting connections (yet).
    #[error("server unreachable at {address}: {reason}")]
    Unreachable {
        /// Address the client tried to reach.
        address: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server answered, but not with a usable topology payload.
    #[error("malformed topology response from {address}: {reason}")]
    Protocol {
        /// Address the response came from.
        address: String,
        /// Reason for failure.
        reason: String,
    },
}
