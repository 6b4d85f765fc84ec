//! Docker-backed container runtime.
//!
//! Adapts a local Docker daemon to the [`ContainerRuntime`] contract: pulls
//! the image when needed, replaces stale same-named containers from earlier
//! runs, publishes the gateway port to an ephemeral host port, and resolves
//! the mapping by inspecting the started container.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use futures::StreamExt;

use crate::container::error::{ProvisioningError, Result};
use crate::container::{ContainerHandle, ContainerRuntime, ContainerSpec};

/// Connect to the local Docker daemon.
///
/// Tries bollard's platform defaults first (`DOCKER_HOST`, the standard
/// socket, the Windows named pipe), then the Docker Desktop socket under the
/// user's home directory. Each candidate must answer a ping.
pub(crate) async fn connect_docker() -> std::result::Result<Docker, bollard::errors::Error> {
    let docker = Docker::connect_with_local_defaults()?;
    if docker.ping().await.is_ok() {
        return Ok(docker);
    }

    #[cfg(unix)]
    if let Some(home) = dirs::home_dir() {
        let socket = home.join(".docker/run/docker.sock");
        if socket.exists()
            && let Some(path) = socket.to_str()
            && let Ok(desktop) = Docker::connect_with_unix(path, 30, bollard::API_DEFAULT_VERSION)
            && desktop.ping().await.is_ok()
        {
            return Ok(desktop);
        }
    }

    // Surface the ping failure from the default connection.
    docker.ping().await?;
    Ok(docker)
}

/// Container runtime backed by a local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local daemon.
    pub async fn connect() -> Result<Self> {
        let docker =
            connect_docker()
                .await
                .map_err(|e| ProvisioningError::DaemonUnavailable {
                    reason: e.to_string(),
                })?;
        Ok(Self { docker })
    }

    /// Pull `image` unless it is already present locally.
    async fn pull_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            tracing::debug!("image '{image}' exists locally");
            return Ok(());
        }

        tracing::info!("pulling image: {image}");

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::trace!("pull status: {status}");
                    }
                }
                Err(e) => {
                    return Err(ProvisioningError::ImagePullFailed {
                        image: image.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("pulled image: {image}");
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn start(&self, spec: &ContainerSpec) -> Result<Box<dyn ContainerHandle>> {
        // Replace a stale container left behind by an earlier run.
        let _ = self
            .docker
            .remove_container(
                &spec.name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        if spec.auto_pull {
            self.pull_image(&spec.image).await?;
        }

        let env: Vec<String> = spec.env.iter().map(|(k, v)| format!("{k}={v}")).collect();

        let exposed_ports: HashMap<String, HashMap<(), ()>> =
            [(format!("{}/tcp", spec.gateway_port), HashMap::new())]
                .into_iter()
                .collect();

        let host_config = HostConfig {
            // Ephemeral host port; resolved by inspection after start.
            publish_all_ports: Some(true),
            auto_remove: Some(false),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: if env.is_empty() { None } else { Some(env) },
            exposed_ports: Some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| ProvisioningError::CreationFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        self.docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| ProvisioningError::StartFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("started container '{}' from {}", spec.name, spec.image);

        Ok(Box::new(DockerContainer {
            docker: self.docker.clone(),
            id: created.id,
            name: spec.name.clone(),
        }))
    }
}

/// A running container managed through the Docker daemon.
pub struct DockerContainer {
    docker: Docker,
    id: String,
    name: String,
}

#[async_trait]
impl ContainerHandle for DockerContainer {
    async fn mapped_port(&self, container_port: u16) -> Result<u16> {
        let info = self.docker.inspect_container(&self.id, None).await.map_err(|e| {
            ProvisioningError::PortNotMapped {
                port: container_port,
                reason: e.to_string(),
            }
        })?;

        let key = format!("{container_port}/tcp");
        info.network_settings
            .and_then(|settings| settings.ports)
            .and_then(|mut ports| ports.remove(&key).flatten())
            .and_then(|bindings| bindings.into_iter().find_map(|b| b.host_port))
            .and_then(|port| port.parse().ok())
            .ok_or_else(|| ProvisioningError::PortNotMapped {
                port: container_port,
                reason: "not published".to_string(),
            })
    }

    async fn stop(&self) {
        let result = self
            .docker
            .remove_container(
                &self.id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        match result {
            Ok(()) => tracing::info!("stopped container '{}'", self.name),
            // Already gone is fine; stop is best-effort.
            Err(e) => tracing::debug!("removing container '{}': {e}", self.name),
        }
    }
}
