//! Node health tracking with lazy cooldown eligibility.
//!
//! # State transitions
//! ```text
//! Available   → Unavailable: report_failure (forwarding failed)
//! Unavailable → Available:   report_success (a later attempt succeeded)
//! ```
//!
//! There is no timer-driven flip back to Available. Once the cooldown has
//! elapsed the node merely becomes *eligible* for another attempt; only an
//! explicit success makes it Available again (optimistic retry).
//!
//! # Concurrency
//! Per-node atomics only. Eligibility checks and state updates are short,
//! lock-free operations; no lock is ever held across a network call.
//! Last-writer-wins on the failure timestamp is acceptable: staleness
//! delays eligibility by at most one concurrent failure's margin.

use std::time::{Duration, Instant};

use crate::cluster::node::{Availability, Node};
use crate::observability::metrics;

/// Default cooldown before a failed node is worth another attempt.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(900);

/// Tracks per-node availability and cooldown timing.
///
/// Timestamps are stored on each node as milliseconds since this
/// tracker's anchor instant, so they fit in an atomic u64.
#[derive(Debug)]
pub struct HealthTracker {
    cooldown: Duration,
    anchor: Instant,
}

impl HealthTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            anchor: Instant::now(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn millis_since_anchor(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.anchor).as_millis() as u64
    }

    /// Mark the node Unavailable as of `now`.
    pub fn report_failure(&self, node: &Node, now: Instant) {
        let previous = node.set_unavailable(self.millis_since_anchor(now));
        if previous == Availability::Available {
            tracing::warn!(
                node = %node,
                cooldown_secs = self.cooldown.as_secs(),
                "Node marked unavailable"
            );
        }
        metrics::record_node_availability(&node.authority(), false);
    }

    /// Mark the node Available and clear its cooldown marker.
    pub fn report_success(&self, node: &Node) {
        let previous = node.set_available();
        if previous == Availability::Unavailable {
            tracing::info!(node = %node, "Node available again");
        }
        metrics::record_node_availability(&node.authority(), true);
    }

    /// Whether the node is worth attempting at `now`.
    ///
    /// True for Available nodes, and for Unavailable nodes whose cooldown
    /// has elapsed. Not a confirmed-good verdict: only `report_success`
    /// transitions a node back to Available.
    pub fn is_eligible(&self, node: &Node, now: Instant) -> bool {
        match node.availability() {
            Availability::Available => true,
            Availability::Unavailable => {
                let elapsed = self
                    .millis_since_anchor(now)
                    .saturating_sub(node.marked_unavailable_at_millis());
                elapsed >= self.cooldown.as_millis() as u64
            }
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Node {
        Node::new("127.0.0.1", 9200).unwrap()
    }

    #[test]
    fn failed_node_is_ineligible_until_cooldown_elapses() {
        let tracker = HealthTracker::new(Duration::from_secs(900));
        let node = node();
        let t0 = Instant::now();

        assert!(tracker.is_eligible(&node, t0));

        tracker.report_failure(&node, t0);
        assert!(!tracker.is_eligible(&node, t0));
        assert!(!tracker.is_eligible(&node, t0 + Duration::from_secs(899)));
        assert!(tracker.is_eligible(&node, t0 + Duration::from_secs(900)));
        assert!(tracker.is_eligible(&node, t0 + Duration::from_secs(3600)));

        // Eligibility alone never flips the state back.
        assert_eq!(node.availability(), Availability::Unavailable);
    }

    #[test]
    fn success_makes_node_available_immediately() {
        let tracker = HealthTracker::new(Duration::from_secs(900));
        let node = node();
        let t0 = Instant::now();

        tracker.report_failure(&node, t0);
        tracker.report_success(&node);

        assert_eq!(node.availability(), Availability::Available);
        assert!(tracker.is_eligible(&node, t0));
    }

    #[test]
    fn repeated_failure_restarts_the_cooldown() {
        let tracker = HealthTracker::new(Duration::from_secs(100));
        let node = node();
        let t0 = Instant::now();

        tracker.report_failure(&node, t0);
        tracker.report_failure(&node, t0 + Duration::from_secs(90));

        assert!(!tracker.is_eligible(&node, t0 + Duration::from_secs(100)));
        assert!(tracker.is_eligible(&node, t0 + Duration::from_secs(190)));
    }

    #[test]
    fn failure_before_anchor_saturates() {
        let tracker = HealthTracker::new(Duration::from_secs(100));
        let node = node();
        // An Instant from before the tracker existed must not panic.
        let past = Instant::now() - Duration::from_secs(5);
        tracker.report_failure(&node, past);
        assert!(!tracker.is_eligible(&node, Instant::now()));
    }
}
