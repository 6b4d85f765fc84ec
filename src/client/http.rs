//! HTTP gateway adapter for the client contract.
//!
//! Queries a gateway exposing cluster topology as JSON at `/v1/topology`.
//! Connect errors and timeouts map to [`TransportError::Unreachable`] so the
//! readiness poller treats them as "not ready yet"; anything the server
//! actively answers wrong maps to [`TransportError::Protocol`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::client::{ClientHandle, Connector, TopologySnapshot, TransportError};

/// Client for a gateway serving `GET /v1/topology` as JSON.
pub struct HttpGatewayClient {
    address: String,
    http: reqwest::Client,
}

impl HttpGatewayClient {
    /// Create a client for `address` (`host:port`).
    ///
    /// No connection is made here; the first topology query does that.
    pub fn new(address: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            address: address.into(),
            http,
        }
    }

    fn topology_url(&self) -> String {
        format!("http://{}/v1/topology", self.address)
    }
}

#[async_trait]
impl ClientHandle for HttpGatewayClient {
    async fn query_topology(&self) -> Result<TopologySnapshot, TransportError> {
        let response = self.http.get(self.topology_url()).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                TransportError::Unreachable {
                    address: self.address.clone(),
                    reason: e.to_string(),
                }
            } else {
                TransportError::Protocol {
                    address: self.address.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Protocol {
                address: self.address.clone(),
                reason: format!("status {status}"),
            });
        }

        response
            .json::<TopologySnapshot>()
            .await
            .map_err(|e| TransportError::Protocol {
                address: self.address.clone(),
                reason: e.to_string(),
            })
    }

    async fn close(&self) {
        // reqwest clients hold no server-side state to release.
    }
}

/// Connector producing [`HttpGatewayClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpGatewayConnector;

#[async_trait]
impl Connector for HttpGatewayConnector {
    async fn connect(&self, address: &str) -> Result<Arc<dyn ClientHandle>, TransportError> {
        Ok(Arc::new(HttpGatewayClient::new(address)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_url() {
        let client = HttpGatewayClient::new("127.0.0.1:26500");
        assert_eq!(client.topology_url(), "http://127.0.0.1:26500/v1/topology");
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_unreachable() {
        // Port 1 is essentially never listening locally.
        let client = HttpGatewayClient::new("127.0.0.1:1");

        let err = client
            .query_topology()
            .await
            .expect_err("query against a closed port should fail");
        assert!(matches!(err, TransportError::Unreachable { .. }), "{err}");
    }
}
