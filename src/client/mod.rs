//! Client-side contract for the server under test.
//!
//! The environment core never speaks the server's wire protocol itself; it
//! only needs a client that can report cluster topology and close cleanly.
//! [`Connector`] is the seam through which the environment builds that client
//! against the container's dynamically published port: production code wires
//! in [`HttpGatewayConnector`], tests wire in scripted stubs.

pub mod error;
pub mod http;

pub use error::TransportError;
pub use http::{HttpGatewayClient, HttpGatewayConnector};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

/// One broker's entry in a topology snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerInfo {
    /// Cluster-unique node id.
    pub node_id: u32,
    /// Advertised host.
    pub host: String,
    /// Advertised port.
    pub port: u16,
    /// Number of partitions this broker currently owns.
    pub partitions: u32,
}

/// Cluster topology as reported by the server at one point in time.
///
/// Evaluated against a readiness predicate and then discarded; the harness
/// never retains snapshots.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopologySnapshot {
    /// Brokers in the order the server reported them.
    pub brokers: Vec<BrokerInfo>,
}

impl TopologySnapshot {
    /// Total partitions across all brokers.
    pub fn total_partitions(&self) -> u32 {
        self.brokers.iter().map(|b| b.partitions).sum()
    }
}

/// A connected client for the server under test.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    /// Query the current cluster topology.
    ///
    /// Fails with [`TransportError`] when the server cannot be reached,
    /// which is expected while a freshly started server is still coming up.
    async fn query_topology(&self) -> Result<TopologySnapshot, TransportError>;

    /// Close the client. Best-effort: must not fail when the server is
    /// already gone.
    async fn close(&self);
}

/// Builds clients against a resolved address.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Build a client for `address` (`host:port`).
    async fn connect(&self, address: &str) -> Result<Arc<dyn ClientHandle>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_partitions_sums_brokers() {
        let snapshot = TopologySnapshot {
            brokers: vec![
                BrokerInfo {
                    node_id: 0,
                    host: "10.0.0.5".to_string(),
                    port: 26501,
                    partitions: 2,
                },
                BrokerInfo {
                    node_id: 1,
                    host: "10.0.0.6".to_string(),
                    port: 26501,
                    partitions: 1,
                },
            ],
        };
        assert_eq!(snapshot.total_partitions(), 3);
    }

    #[test]
    fn test_empty_snapshot_has_no_partitions() {
        assert_eq!(TopologySnapshot::default().total_partitions(), 0);
    }

    #[test]
    fn test_snapshot_deserializes_from_gateway_payload() {
        let payload = r#"{
            "brokers": [
                {"node_id": 0, "host": "10.0.0.5", "port": 26501, "partitions": 1}
            ]
        }"#;

        let snapshot: TopologySnapshot =
            serde_json::from_str(payload).expect("payload should deserialize");
        assert_eq!(snapshot.brokers.len(), 1);
        assert_eq!(snapshot.brokers[0].node_id, 0);
        assert_eq!(snapshot.brokers[0].partitions, 1);
    }
}
