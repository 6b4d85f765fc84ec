//! Configuration for containerized test environments.
//!
//! Everything here is an already-resolved value handed in by the surrounding
//! harness. The crate reads no environment variables, files, or CLI flags.

use std::time::Duration;

use crate::container::ContainerSpec;

/// Version tag used by [`Environment::latest`](crate::Environment::latest).
pub const DEFAULT_VERSION: &str = "latest";

/// Retry policy for readiness polling.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Wait between topology queries. Clamped to a small floor by the
    /// poller; cluster convergence takes hundreds of milliseconds, so
    /// polling tighter buys nothing.
    pub interval: Duration,
    /// Give up after this long. `None` waits forever, which is acceptable
    /// only inside a controlled test harness.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: Some(Duration::from_secs(60)),
        }
    }
}

impl PollPolicy {
    /// Fixed-interval polling that gives up after `deadline`.
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            deadline: Some(deadline),
        }
    }

    /// Polling without a deadline: blocks until the cluster converges,
    /// however long that takes.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }
}

/// Configuration for a single environment.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// Image repository of the server under test, without tag.
    pub image: String,
    /// Version tag selecting which server build to run.
    pub version: String,
    /// Gateway port inside the container.
    pub gateway_port: u16,
    /// Partition count the topology must report before tests may proceed.
    pub expected_partitions: u32,
    /// Environment variables for the container.
    pub env: Vec<(String, String)>,
    /// Container name. A stale container with the same name from an earlier
    /// run is replaced on start.
    pub container_name: String,
    /// Pull the image when it is missing locally.
    pub auto_pull: bool,
    /// Readiness polling policy.
    pub poll: PollPolicy,
}

impl EnvironmentConfig {
    /// Config for `image` at `version`, with defaults for everything else.
    pub fn new(image: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            version: version.into(),
            gateway_port: 26500,
            expected_partitions: 1,
            env: Vec::new(),
            container_name: "clusterbed-env".to_string(),
            auto_pull: true,
            poll: PollPolicy::default(),
        }
    }

    /// Full image reference including the version tag.
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.version)
    }

    /// The container spec this configuration provisions.
    pub fn container_spec(&self) -> ContainerSpec {
        ContainerSpec {
            image: self.image_ref(),
            name: self.container_name.clone(),
            gateway_port: self.gateway_port,
            env: self.env.clone(),
            auto_pull: self.auto_pull,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_includes_version() {
        let config = EnvironmentConfig::new("registry.example.com/broker", "1.4.0");
        assert_eq!(config.image_ref(), "registry.example.com/broker:1.4.0");
    }

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::new("broker", DEFAULT_VERSION);
        assert_eq!(config.expected_partitions, 1);
        assert!(config.auto_pull);
        assert_eq!(config.poll.interval, Duration::from_millis(500));
        assert_eq!(config.poll.deadline, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_unbounded_policy_has_no_deadline() {
        let policy = PollPolicy::unbounded(Duration::from_millis(250));
        assert!(policy.deadline.is_none());
    }

    #[test]
    fn test_container_spec_carries_config() {
        let mut config = EnvironmentConfig::new("broker", "2.0.1");
        config.env.push(("CLUSTER_SIZE".to_string(), "1".to_string()));

        let spec = config.container_spec();
        assert_eq!(spec.image, "broker:2.0.1");
        assert_eq!(spec.gateway_port, 26500);
        assert_eq!(spec.env.len(), 1);
    }
}
