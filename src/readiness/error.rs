//! Error types for readiness polling.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while waiting for the cluster to converge.
#[derive(Debug, Clone, Error)]
pub enum ReadinessError {
    /// The deadline elapsed before the topology satisfied the predicate.
    #[error("cluster not ready after {waited:?} (poll interval {interval:?})")]
    Timeout {
        /// How long the poller waited.
        waited: Duration,
        /// Poll interval in effect.
        interval: Duration,
    },
}
