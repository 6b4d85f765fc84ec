//! Container-side contract for the server under test.
//!
//! The container runtime is an external collaborator: the environment core
//! only needs to start a container described by a [`ContainerSpec`], resolve
//! the host port its gateway was published to, and stop it again.
//! [`DockerRuntime`] adapts a local Docker daemon to this contract; tests
//! substitute scripted runtimes through the same seam.

pub mod detect;
pub mod docker;
pub mod error;

pub use detect::{DockerStatus, check_docker};
pub use docker::{DockerContainer, DockerRuntime};
pub use error::ProvisioningError;

use async_trait::async_trait;

/// What to run, assembled by the environment from its configuration.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image reference including tag.
    pub image: String,
    /// Container name. A stale container with the same name is replaced.
    pub name: String,
    /// Gateway port to publish to an ephemeral host port.
    pub gateway_port: u16,
    /// Environment variables.
    pub env: Vec<(String, String)>,
    /// Pull the image when it is missing locally.
    pub auto_pull: bool,
}

/// A started container, owned exclusively by one environment.
#[async_trait]
pub trait ContainerHandle: Send + Sync {
    /// Host port the given container port was published to.
    async fn mapped_port(&self, container_port: u16) -> error::Result<u16>;

    /// Stop and release the container. Best-effort: must not fail on a
    /// container that is already gone.
    async fn stop(&self);
}

/// Starts containers. The seam that lets tests substitute a scripted runtime
/// for the Docker daemon.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Start a container for `spec`.
    ///
    /// A failure here is fatal to environment setup; there is no retry at
    /// this layer.
    async fn start(&self, spec: &ContainerSpec) -> error::Result<Box<dyn ContainerHandle>>;
}
