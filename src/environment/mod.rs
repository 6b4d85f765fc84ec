//! Environment lifecycle orchestration.
//!
//! [`Environment`] drives one containerized server instance through a strict
//! phase sequence and hands a ready client to test code:
//!
//! ```text
//! Idle ──setup()──▶ Provisioning ──▶ AwaitingReadiness ──▶ Ready
//!   ▲                                                        │
//!   └───────────── TearingDown ◀───────── teardown() ────────┘
//! ```
//!
//! `setup` either returns a client whose reported topology already satisfies
//! the configured readiness predicate, or an error naming the phase that
//! failed; it never hands out a half-initialized client. `teardown` releases
//! whatever was acquired, never fails, and is safe from any phase, including
//! after a failed setup. Each environment is single-use per container: there
//! is no path back to `Provisioning` except through `Idle`.

pub mod error;

pub use error::EnvironmentError;

use std::fmt;
use std::mem;
use std::sync::Arc;

use crate::client::{ClientHandle, Connector};
use crate::config::{DEFAULT_VERSION, EnvironmentConfig};
use crate::container::{ContainerHandle, ContainerRuntime};
use crate::readiness::{PartitionsAssigned, ReadinessPoller};

/// Owned handles per phase.
///
/// A client only ever exists alongside the container it talks to; the
/// variants make the reverse unrepresentable.
enum Phase {
    Idle,
    Provisioning {
        container: Box<dyn ContainerHandle>,
    },
    AwaitingReadiness {
        container: Box<dyn ContainerHandle>,
        client: Arc<dyn ClientHandle>,
    },
    Ready {
        container: Box<dyn ContainerHandle>,
        client: Arc<dyn ClientHandle>,
    },
    TearingDown,
}

impl Phase {
    fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Provisioning { .. } => PhaseKind::Provisioning,
            Phase::AwaitingReadiness { .. } => PhaseKind::AwaitingReadiness,
            Phase::Ready { .. } => PhaseKind::Ready,
            Phase::TearingDown => PhaseKind::TearingDown,
        }
    }
}

/// Discriminant of the current lifecycle phase.
///
/// After a failed setup this records the phase that failed: `Idle` when the
/// container never started, `Provisioning` when it started but no client
/// could be built, `AwaitingReadiness` when the cluster never converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// Nothing provisioned.
    Idle,
    /// Container started, no client yet.
    Provisioning,
    /// Client connected, topology not yet converged.
    AwaitingReadiness,
    /// Client handed off to test code.
    Ready,
    /// Handles being released.
    TearingDown,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Idle => "idle",
            PhaseKind::Provisioning => "provisioning",
            PhaseKind::AwaitingReadiness => "awaiting readiness",
            PhaseKind::Ready => "ready",
            PhaseKind::TearingDown => "tearing down",
        };
        write!(f, "{name}")
    }
}

/// One containerized server environment, single-use per container.
///
/// Not reentrant: `setup` and `teardown` take `&mut self`, so the borrow
/// checker rules out concurrent calls on one instance. Parallel test runs
/// use independent instances; container and client handles are never shared
/// across environments.
pub struct Environment {
    config: EnvironmentConfig,
    runtime: Arc<dyn ContainerRuntime>,
    connector: Arc<dyn Connector>,
    phase: Phase,
}

impl Environment {
    /// Environment for `image` at the default `latest` tag.
    pub fn latest(
        image: impl Into<String>,
        runtime: Arc<dyn ContainerRuntime>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self::with_config(EnvironmentConfig::new(image, DEFAULT_VERSION), runtime, connector)
    }

    /// Environment with an explicit configuration (pinned version, ports,
    /// polling policy).
    pub fn with_config(
        config: EnvironmentConfig,
        runtime: Arc<dyn ContainerRuntime>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            runtime,
            connector,
            phase: Phase::Idle,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> PhaseKind {
        self.phase.kind()
    }

    /// Whether a client has been handed off and the environment is live.
    pub fn is_ready(&self) -> bool {
        self.phase() == PhaseKind::Ready
    }

    /// The configuration this environment provisions from.
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Provision the container, connect a client, and wait for readiness.
    ///
    /// Valid only while idle. On success the environment is `Ready` and the
    /// returned client's topology already satisfies the readiness predicate.
    /// On failure the error names the phase that failed; anything acquired
    /// by then stays owned by the environment so that a subsequent
    /// [`teardown`](Self::teardown) releases it.
    pub async fn setup(&mut self) -> error::Result<Arc<dyn ClientHandle>> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(EnvironmentError::NotIdle {
                phase: self.phase.kind(),
            });
        }

        // Provisioning. Nothing is owned until start returns, so a start
        // failure leaves the environment idle with nothing to release.
        tracing::info!(image = %self.config.image_ref(), "provisioning environment");
        let container = self.runtime.start(&self.config.container_spec()).await?;

        // The container is owned from here on: every failure below parks the
        // acquired handles in the phase for teardown() to release.
        let port = match container.mapped_port(self.config.gateway_port).await {
            Ok(port) => port,
            Err(e) => {
                self.phase = Phase::Provisioning { container };
                return Err(e.into());
            }
        };

        let address = format!("127.0.0.1:{port}");
        let client = match self.connector.connect(&address).await {
            Ok(client) => client,
            Err(e) => {
                self.phase = Phase::Provisioning { container };
                return Err(EnvironmentError::Connect(e));
            }
        };

        // Awaiting readiness.
        tracing::info!(%address, "client connected, awaiting cluster readiness");
        let poller = ReadinessPoller::new(self.config.poll);
        let predicate = PartitionsAssigned::new(self.config.expected_partitions);
        if let Err(e) = poller.wait_until_ready(client.as_ref(), &predicate).await {
            self.phase = Phase::AwaitingReadiness { container, client };
            return Err(e.into());
        }

        tracing::info!("environment ready");
        self.phase = Phase::Ready {
            container,
            client: Arc::clone(&client),
        };
        Ok(client)
    }

    /// Release everything acquired by [`setup`](Self::setup).
    ///
    /// Never fails: close and stop problems are logged and swallowed so that
    /// cleanup always completes. The server may already be gone, and that
    /// must not fail the teardown. Safe from any phase; on an idle
    /// environment it is a no-op. The environment is `Idle` afterwards and
    /// may be set up again.
    pub async fn teardown(&mut self) {
        let phase = mem::replace(&mut self.phase, Phase::TearingDown);

        let (container, client) = match phase {
            Phase::Idle => {
                self.phase = Phase::Idle;
                return;
            }
            Phase::TearingDown => (None, None),
            Phase::Provisioning { container } => (Some(container), None),
            Phase::AwaitingReadiness { container, client }
            | Phase::Ready { container, client } => (Some(container), Some(client)),
        };

        if let Some(client) = client {
            client.close().await;
        }
        if let Some(container) = container {
            container.stop().await;
        }

        tracing::info!("environment torn down");
        self.phase = Phase::Idle;
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            tracing::warn!(
                "environment dropped without teardown(), container '{}' may still be running",
                self.config.container_name
            );
        }
    }
}
