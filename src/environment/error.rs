//! Error types for environment setup.

use thiserror::Error;

use crate::client::TransportError;
use crate::container::ProvisioningError;
use crate::environment::PhaseKind;
use crate::readiness::ReadinessError;

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, EnvironmentError>;

/// Errors surfaced by [`Environment::setup`](crate::Environment::setup),
/// naming the phase that failed.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// Setup called while a previous environment is still active.
    #[error("setup requires an idle environment (currently {phase})")]
    NotIdle {
        /// Phase the environment was in.
        phase: PhaseKind,
    },

    /// The container could not be provisioned.
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    /// The client could not be built against the mapped port.
    #[error("client connection failed: {0}")]
    Connect(#[source] TransportError),

    /// The cluster never reported a usable topology.
    #[error("readiness polling failed: {0}")]
    Readiness(#[from] ReadinessError),
}
