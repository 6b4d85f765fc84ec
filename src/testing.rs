//! Scripted test doubles for the environment lifecycle.
//!
//! Provides:
//! - [`ScriptedClient`]: a client that fails a configured number of topology
//!   queries with transport errors, then reports a fixed snapshot
//! - [`StubRuntime`]: a container runtime that records starts and stops and
//!   can be made to fail provisioning
//! - [`StubConnector`]: a connector that hands out prepared clients and
//!   records the addresses it was asked for
//!
//! Use these instead of ad-hoc stub implementations in tests; lifecycle
//! behavior can be exercised without Docker or a live server.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{BrokerInfo, ClientHandle, Connector, TopologySnapshot, TransportError};
use crate::container::{ContainerHandle, ContainerRuntime, ContainerSpec, ProvisioningError};

/// Snapshot with a single broker owning `partitions` partitions.
pub fn single_broker_snapshot(partitions: u32) -> TopologySnapshot {
    TopologySnapshot {
        brokers: vec![BrokerInfo {
            node_id: 0,
            host: "127.0.0.1".to_string(),
            port: 26501,
            partitions,
        }],
    }
}

/// A client whose first `failures` topology queries raise transport errors,
/// after which every query reports a fixed snapshot.
pub struct ScriptedClient {
    snapshot: TopologySnapshot,
    failures: u32,
    calls: AtomicU32,
    closed: AtomicBool,
}

impl ScriptedClient {
    /// Always report `snapshot`.
    pub fn ready(snapshot: TopologySnapshot) -> Self {
        Self::after_failures(0, snapshot)
    }

    /// Raise `failures` transport errors, then report `snapshot`.
    pub fn after_failures(failures: u32, snapshot: TopologySnapshot) -> Self {
        Self {
            snapshot,
            failures,
            calls: AtomicU32::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of topology queries issued so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClientHandle for ScriptedClient {
    async fn query_topology(&self) -> Result<TopologySnapshot, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if call < self.failures {
            return Err(TransportError::Unreachable {
                address: "127.0.0.1:0".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.snapshot.clone())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Container stand-in reporting a fixed mapped port.
pub struct StubContainer {
    port: u16,
    stops: Arc<AtomicU32>,
}

#[async_trait]
impl ContainerHandle for StubContainer {
    async fn mapped_port(&self, _container_port: u16) -> Result<u16, ProvisioningError> {
        Ok(self.port)
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runtime stand-in that hands out [`StubContainer`]s.
pub struct StubRuntime {
    port: u16,
    fail_start: AtomicBool,
    starts: AtomicU32,
    stops: Arc<AtomicU32>,
}

impl StubRuntime {
    /// Runtime whose containers publish the gateway on host `port`.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            fail_start: AtomicBool::new(false),
            starts: AtomicU32::new(0),
            stops: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Toggle whether starts should fail.
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::Relaxed);
    }

    /// Number of containers started.
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::Relaxed)
    }

    /// Number of containers stopped.
    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContainerRuntime for StubRuntime {
    async fn start(&self, spec: &ContainerSpec) -> Result<Box<dyn ContainerHandle>, ProvisioningError> {
        if self.fail_start.load(Ordering::Relaxed) {
            return Err(ProvisioningError::StartFailed {
                name: spec.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(StubContainer {
            port: self.port,
            stops: Arc::clone(&self.stops),
        }))
    }
}

/// Connector that hands out prepared clients in order, one per connect call,
/// recording the addresses it was asked for. Connecting with no client left
/// fails with a transport error.
pub struct StubConnector {
    clients: Mutex<Vec<Arc<ScriptedClient>>>,
    addresses: Mutex<Vec<String>>,
}

impl StubConnector {
    /// Connector handing out `clients` front-first.
    pub fn with_clients(clients: Vec<Arc<ScriptedClient>>) -> Self {
        Self {
            clients: Mutex::new(clients),
            addresses: Mutex::new(Vec::new()),
        }
    }

    /// Single-use connector for `client`.
    pub fn single(client: Arc<ScriptedClient>) -> Self {
        Self::with_clients(vec![client])
    }

    /// Connector with no clients: every connect fails.
    pub fn empty() -> Self {
        Self::with_clients(Vec::new())
    }

    /// Addresses `connect` was called with.
    pub fn addresses(&self) -> Vec<String> {
        self.addresses.lock().expect("addresses lock poisoned").clone()
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(&self, address: &str) -> Result<Arc<dyn ClientHandle>, TransportError> {
        self.addresses
            .lock()
            .expect("addresses lock poisoned")
            .push(address.to_string());

        let mut clients = self.clients.lock().expect("clients lock poisoned");
        if clients.is_empty() {
            return Err(TransportError::Unreachable {
                address: address.to_string(),
                reason: "no scripted client".to_string(),
            });
        }
        let client: Arc<dyn ClientHandle> = clients.remove(0);
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_client_fails_then_reports() {
        let client = ScriptedClient::after_failures(2, single_broker_snapshot(1));

        assert!(client.query_topology().await.is_err());
        assert!(client.query_topology().await.is_err());
        let snapshot = client
            .query_topology()
            .await
            .expect("third query should succeed");
        assert_eq!(snapshot.brokers[0].partitions, 1);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_client_records_close() {
        let client = ScriptedClient::ready(single_broker_snapshot(1));
        assert!(!client.is_closed());
        client.close().await;
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_stub_runtime_counts_lifecycle() {
        let runtime = StubRuntime::new(19530);
        let spec = ContainerSpec {
            image: "broker:latest".to_string(),
            name: "stub".to_string(),
            gateway_port: 26500,
            env: Vec::new(),
            auto_pull: false,
        };

        let container = runtime.start(&spec).await.expect("start should succeed");
        assert_eq!(runtime.starts(), 1);
        assert_eq!(container.mapped_port(26500).await.expect("mapped port"), 19530);

        container.stop().await;
        assert_eq!(runtime.stops(), 1);
    }

    #[tokio::test]
    async fn test_empty_connector_refuses() {
        let connector = StubConnector::empty();
        let result = connector.connect("127.0.0.1:19530").await;
        assert!(result.is_err());
        assert_eq!(connector.addresses(), vec!["127.0.0.1:19530".to_string()]);
    }
}
