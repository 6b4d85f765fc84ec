//! Ephemeral containerized cluster environments for integration tests.
//!
//! `clusterbed` provisions a containerized server, connects a client against
//! the dynamically published gateway port, blocks until the server's cluster
//! topology has converged to a usable shape, hands the ready client to test
//! code, and tears the environment down deterministically afterwards,
//! including after a failed setup.
//!
//! The container runtime and the client's wire protocol are external
//! collaborators consumed through the [`ContainerRuntime`]/[`ContainerHandle`]
//! and [`Connector`]/[`ClientHandle`] seams. Adapters for a local Docker
//! daemon ([`container::DockerRuntime`]) and a JSON topology gateway
//! ([`client::HttpGatewayClient`]) are included; [`testing`] provides
//! scripted stand-ins for both seams.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use clusterbed::client::HttpGatewayConnector;
//! use clusterbed::config::EnvironmentConfig;
//! use clusterbed::container::DockerRuntime;
//! use clusterbed::environment::Environment;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = Arc::new(DockerRuntime::connect().await?);
//! let mut env = Environment::with_config(
//!     EnvironmentConfig::new("registry.example.com/broker", "1.4.0"),
//!     runtime,
//!     Arc::new(HttpGatewayConnector),
//! );
//!
//! // Blocks until the cluster reports the expected topology.
//! let client = env.setup().await?;
//! let topology = client.query_topology().await?;
//! assert!(!topology.brokers.is_empty());
//!
//! env.teardown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod container;
pub mod environment;
pub mod readiness;
pub mod testing;

pub use client::{BrokerInfo, ClientHandle, Connector, TopologySnapshot, TransportError};
pub use config::{EnvironmentConfig, PollPolicy};
pub use container::{ContainerHandle, ContainerRuntime, ContainerSpec, ProvisioningError};
pub use environment::{Environment, EnvironmentError, PhaseKind};
pub use readiness::{PartitionsAssigned, ReadinessError, ReadinessPoller, ReadinessPredicate};
