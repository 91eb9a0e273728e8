//! Health Prober
//!
//! Decides whether a node is alive from its own gossip view: a node that
//! reports hearing from itself recently is alive. Any transport failure
//! along the way counts as not alive.

use std::sync::Arc;

use super::types::{Node, NodeId};
use crate::transport::Transport;
use crate::transport::protocol::GossipEntry;

/// Age assumed when a node's gossip does not mention the node itself.
pub const MISSING_GOSSIP_AGE: f64 = 100.0;

pub struct HealthProber {
    transport: Arc<dyn Transport>,
    /// Largest gossip age still considered alive (inclusive).
    liveness_threshold: f64,
}

impl HealthProber {
    pub fn new(transport: Arc<dyn Transport>, liveness_threshold: f64) -> Self {
        Self {
            transport,
            liveness_threshold,
        }
    }

    pub async fn is_alive(&self, node: &Node) -> bool {
        let id = if node.id.is_empty() {
            match self.transport.state(node).await {
                Ok(state) => NodeId(state.identity),
                Err(e) => {
                    tracing::debug!("Could not resolve identity of {}: {}", node.url(), e);
                    return false;
                }
            }
        } else {
            node.id.clone()
        };

        let gossip = match self.transport.gossip(node).await {
            Ok(gossip) => gossip,
            Err(e) => {
                tracing::debug!("Gossip probe of {} failed: {}", id, e);
                return false;
            }
        };

        let age = self_reported_age(&id, &gossip);
        let alive = is_fresh(age, self.liveness_threshold);

        tracing::trace!("Probed {}: age={} alive={}", id, age, alive);

        alive
    }
}

/// The age `id` reports for itself, or [`MISSING_GOSSIP_AGE`].
pub fn self_reported_age(id: &NodeId, gossip: &[GossipEntry]) -> f64 {
    gossip
        .iter()
        .find(|entry| entry.id == id.0)
        .map(|entry| entry.age)
        .unwrap_or(MISSING_GOSSIP_AGE)
}

/// An age exactly at the threshold is still fresh.
pub fn is_fresh(age: f64, threshold: f64) -> bool {
    age <= threshold
}
