//! Readiness polling for a freshly provisioned cluster.
//!
//! A server process accepts connections before its internal cluster protocol
//! has converged, so during startup both transport errors and a wrong-shaped
//! topology are legitimate transient states, not failures. The poller
//! swallows both and retries on a fixed interval; only an exceeded deadline
//! is fatal.

pub mod error;

pub use error::ReadinessError;

use std::time::Duration;

use tokio::time::Instant;

use crate::client::{ClientHandle, TopologySnapshot};
use crate::config::PollPolicy;

/// Floor for the poll interval. Polling a cluster that is still forming
/// tighter than this just hammers it.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Boolean condition over a topology snapshot that defines "usable for
/// testing". Implemented by [`PartitionsAssigned`] and any plain closure.
pub trait ReadinessPredicate: Send + Sync {
    /// Whether `snapshot` describes a usable cluster.
    fn is_ready(&self, snapshot: &TopologySnapshot) -> bool;
}

impl<F> ReadinessPredicate for F
where
    F: Fn(&TopologySnapshot) -> bool + Send + Sync,
{
    fn is_ready(&self, snapshot: &TopologySnapshot) -> bool {
        self(snapshot)
    }
}

/// Ready once the first broker reports the expected number of partitions.
///
/// A snapshot with no brokers is simply not ready yet.
#[derive(Debug, Clone, Copy)]
pub struct PartitionsAssigned {
    expected: u32,
}

impl PartitionsAssigned {
    /// Expect `expected` partitions on the first broker.
    pub fn new(expected: u32) -> Self {
        Self { expected }
    }
}

impl ReadinessPredicate for PartitionsAssigned {
    fn is_ready(&self, snapshot: &TopologySnapshot) -> bool {
        snapshot
            .brokers
            .first()
            .is_some_and(|broker| broker.partitions == self.expected)
    }
}

/// Polls a client until its reported topology satisfies a predicate.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessPoller {
    policy: PollPolicy,
}

impl ReadinessPoller {
    /// Create a poller. Intervals below the floor are clamped.
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy: PollPolicy {
                interval: policy.interval.max(MIN_POLL_INTERVAL),
                ..policy
            },
        }
    }

    /// The effective policy, after clamping.
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Block until `predicate` holds for a topology reported by `client`.
    ///
    /// Transport errors are treated as "not ready yet" and swallowed. The
    /// first structurally successful query is evaluated as-is: an incomplete
    /// topology counts as not ready, never as an error, and a satisfying one
    /// concludes readiness immediately. The deadline is observed between
    /// retries, so a timeout surfaces within one poll interval of it. With
    /// no deadline configured the wait is unbounded, which is acceptable
    /// only inside a controlled test harness.
    pub async fn wait_until_ready(
        &self,
        client: &dyn ClientHandle,
        predicate: &dyn ReadinessPredicate,
    ) -> Result<(), ReadinessError> {
        let started = Instant::now();

        loop {
            match client.query_topology().await {
                Ok(snapshot) => {
                    if predicate.is_ready(&snapshot) {
                        tracing::debug!(
                            brokers = snapshot.brokers.len(),
                            "cluster topology converged"
                        );
                        return Ok(());
                    }
                    tracing::trace!(
                        brokers = snapshot.brokers.len(),
                        "topology not yet as expected"
                    );
                }
                Err(e) => {
                    tracing::trace!("topology query failed, retrying: {e}");
                }
            }

            if let Some(deadline) = self.policy.deadline
                && started.elapsed() >= deadline
            {
                return Err(ReadinessError::Timeout {
                    waited: started.elapsed(),
                    interval: self.policy.interval,
                });
            }

            tokio::time::sleep(self.policy.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedClient, single_broker_snapshot};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_predicate_matches_expected_partitions() {
        let predicate = PartitionsAssigned::new(1);
        assert!(predicate.is_ready(&single_broker_snapshot(1)));
        assert!(!predicate.is_ready(&single_broker_snapshot(3)));
    }

    #[test]
    fn test_zero_brokers_is_not_ready() {
        // Distinct from a transport error: evaluates cleanly to false.
        let predicate = PartitionsAssigned::new(1);
        assert!(!predicate.is_ready(&TopologySnapshot::default()));
    }

    #[test]
    fn test_closure_predicate() {
        let predicate = |snapshot: &TopologySnapshot| snapshot.total_partitions() >= 2;
        assert!(predicate.is_ready(&single_broker_snapshot(2)));
        assert!(!predicate.is_ready(&single_broker_snapshot(1)));
    }

    #[test]
    fn test_interval_is_clamped_away_from_zero() {
        let poller = ReadinessPoller::new(PollPolicy::unbounded(Duration::ZERO));
        assert_eq!(poller.policy().interval, MIN_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn test_first_satisfying_query_concludes_readiness() {
        let client = ScriptedClient::ready(single_broker_snapshot(1));
        let poller = ReadinessPoller::new(PollPolicy::new(ms(50), ms(500)));

        poller
            .wait_until_ready(&client, &PartitionsAssigned::new(1))
            .await
            .expect("already-converged cluster should be ready immediately");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let client = ScriptedClient::after_failures(3, single_broker_snapshot(1));
        let poller = ReadinessPoller::new(PollPolicy::new(ms(50), ms(500)));

        poller
            .wait_until_ready(&client, &PartitionsAssigned::new(1))
            .await
            .expect("poller should retry through transport errors");
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_within_one_interval_of_deadline() {
        // Topology never satisfies the predicate; only the deadline stops us.
        let client = ScriptedClient::ready(TopologySnapshot::default());
        let poller = ReadinessPoller::new(PollPolicy::new(ms(50), ms(500)));

        let started = Instant::now();
        let err = poller
            .wait_until_ready(&client, &PartitionsAssigned::new(1))
            .await
            .expect_err("a never-converging cluster must time out");

        let elapsed = started.elapsed();
        assert!(elapsed >= ms(500), "timed out early: {elapsed:?}");
        assert!(elapsed <= ms(550), "timed out late: {elapsed:?}");
        assert!(matches!(err, ReadinessError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_transport_errors_time_out() {
        let client = ScriptedClient::after_failures(u32::MAX, single_broker_snapshot(1));
        let poller = ReadinessPoller::new(PollPolicy::new(ms(50), ms(200)));

        let err = poller
            .wait_until_ready(&client, &PartitionsAssigned::new(1))
            .await
            .expect_err("an unreachable server must time out");
        assert!(matches!(err, ReadinessError::Timeout { waited, .. } if waited >= ms(200)));
    }
}
