//! End-to-end lifecycle against a real Docker daemon.
//!
//! Needs a gateway image that serves `GET /v1/topology`; opt in with
//! `CLUSTERBED_E2E_IMAGE=<image[:tag]> cargo test -- --ignored`.

use std::sync::Arc;

use anyhow::Result;

use clusterbed::client::HttpGatewayConnector;
use clusterbed::config::EnvironmentConfig;
use clusterbed::container::{DockerRuntime, check_docker};
use clusterbed::environment::Environment;

#[tokio::test]
#[ignore = "requires Docker and a local gateway image"]
async fn provisions_polls_and_tears_down() -> Result<()> {
    let Ok(image_ref) = std::env::var("CLUSTERBED_E2E_IMAGE") else {
        eprintln!("CLUSTERBED_E2E_IMAGE not set, skipping");
        return Ok(());
    };
    if !check_docker().await.is_ok() {
        eprintln!("no Docker daemon reachable, skipping");
        return Ok(());
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter("clusterbed=debug")
        .try_init();

    let (image, version) = image_ref
        .split_once(':')
        .unwrap_or((image_ref.as_str(), "latest"));
    let config = EnvironmentConfig::new(image, version);

    let runtime = Arc::new(DockerRuntime::connect().await?);
    let mut env = Environment::with_config(config, runtime, Arc::new(HttpGatewayConnector));

    let client = env.setup().await?;
    let topology = client.query_topology().await?;
    assert!(
        !topology.brokers.is_empty(),
        "a ready cluster must report at least one broker"
    );

    env.teardown().await;
    Ok(())
}
