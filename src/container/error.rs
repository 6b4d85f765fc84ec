//! Error types for container provisioning.

use thiserror::Error;

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// Errors raised while provisioning the server container.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// No Docker daemon reachable.
    #[error("Docker not available: {reason}")]
    DaemonUnavailable {
        /// Reason why the daemon is unavailable.
        reason: String,
    },

    /// Failed to pull the image.
    #[error("failed to pull image '{image}': {reason}")]
    ImagePullFailed {
        /// Image reference.
        image: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to create the container.
    #[error("failed to create container '{name}': {reason}")]
    CreationFailed {
        /// Container name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to start the container.
    #[error("failed to start container '{name}': {reason}")]
    StartFailed {
        /// Container name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// The published host port could not be resolved.
    #[error("no host port published for container port {port}: {reason}")]
    PortNotMapped {
        /// Container-side port.
        port: u16,
        /// Reason for failure.
        reason: String,
    },
}
