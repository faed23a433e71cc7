//! Ordered node pool and candidate selection.
//!
//! # Responsibilities
//! - Hold the configured nodes: element 0 is the primary, the rest are
//!   secondaries in trial order
//! - Derive the per-request candidate sequence from current eligibility
//!
//! The order is fixed at configuration time and never reshuffled; only
//! availability state changes.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::cluster::health::HealthTracker;
use crate::cluster::node::Node;
use crate::config::NodeConfig;

/// Error constructing a pool from configuration.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no backend nodes configured")]
    Empty,
    #[error("invalid node address {authority:?}: {source}")]
    InvalidNode {
        authority: String,
        source: url::ParseError,
    },
}

/// The configured, ordered set of backend nodes.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Arc<Node>>,
}

impl NodePool {
    pub fn new(nodes: Vec<Arc<Node>>) -> Result<Self, PoolError> {
        if nodes.is_empty() {
            return Err(PoolError::Empty);
        }
        Ok(Self { nodes })
    }

    /// Build the pool from configuration, preserving configured order.
    pub fn from_config(configs: &[NodeConfig]) -> Result<Self, PoolError> {
        let nodes = configs
            .iter()
            .map(|c| {
                Node::new(c.host.clone(), c.port)
                    .map(Arc::new)
                    .map_err(|source| PoolError::InvalidNode {
                        authority: format!("{}:{}", c.host, c.port),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(nodes)
    }

    /// The primary node (first in configured order).
    pub fn primary(&self) -> &Arc<Node> {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// The ordered nodes one request may attempt.
    ///
    /// All eligible nodes in configured order. If nothing is eligible the
    /// sequence degrades to exactly the primary, so the dispatcher always
    /// has one last-resort attempt instead of failing before any network
    /// try.
    pub fn candidates(&self, tracker: &HealthTracker, now: Instant) -> Vec<Arc<Node>> {
        let eligible: Vec<Arc<Node>> = self
            .nodes
            .iter()
            .filter(|node| tracker.is_eligible(node, now))
            .cloned()
            .collect();

        if eligible.is_empty() {
            tracing::debug!(
                primary = %self.primary(),
                "No eligible nodes, degrading to primary-only attempt"
            );
            vec![Arc::clone(self.primary())]
        } else {
            eligible
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pool(n: usize) -> NodePool {
        let configs: Vec<NodeConfig> = (0..n)
            .map(|i| NodeConfig {
                host: "127.0.0.1".into(),
                port: 9200 + i as u16,
            })
            .collect();
        NodePool::from_config(&configs).unwrap()
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(matches!(NodePool::from_config(&[]), Err(PoolError::Empty)));
    }

    #[test]
    fn all_available_yields_configured_order() {
        let pool = pool(3);
        let tracker = HealthTracker::new(Duration::from_secs(900));
        let candidates = pool.candidates(&tracker, Instant::now());
        let ports: Vec<u16> = candidates.iter().map(|n| n.port).collect();
        assert_eq!(ports, vec![9200, 9201, 9202]);
    }

    #[test]
    fn failed_primary_is_skipped_until_cooldown() {
        let pool = pool(3);
        let tracker = HealthTracker::new(Duration::from_secs(900));
        let t0 = Instant::now();

        tracker.report_failure(pool.primary(), t0);

        let ports: Vec<u16> = pool
            .candidates(&tracker, t0)
            .iter()
            .map(|n| n.port)
            .collect();
        assert_eq!(ports, vec![9201, 9202]);

        // Past the cooldown the primary is worth attempting again, in
        // configured order.
        let later = t0 + Duration::from_secs(900);
        let ports: Vec<u16> = pool
            .candidates(&tracker, later)
            .iter()
            .map(|n| n.port)
            .collect();
        assert_eq!(ports, vec![9200, 9201, 9202]);
    }

    #[test]
    fn fully_down_pool_degrades_to_primary_only() {
        let pool = pool(3);
        let tracker = HealthTracker::new(Duration::from_secs(900));
        let t0 = Instant::now();

        for node in pool.nodes() {
            tracker.report_failure(node, t0);
        }

        let candidates = pool.candidates(&tracker, t0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].port, pool.primary().port);
    }
}
