//! Topology Discoverer
//!
//! Asks every reachable node for the topology it serves and merges the
//! declared members into the registry.
//!
//! One node failing does not stop the pass; the pass only fails when no
//! queried node answered at all.

use std::sync::Arc;

use super::registry::{MergeOutcome, Registry};
use super::types::Node;
use crate::error::{ClusterError, MultiError};
use crate::transport::Transport;
use crate::transport::protocol::TopologyView;

/// What a successful discovery pass did.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Nodes that returned a topology.
    pub answered: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Nodes that could not be queried. Never the full set on success.
    pub failures: MultiError,
}

pub struct TopologyDiscoverer {
    transport: Arc<dyn Transport>,
    registry: Arc<Registry>,
}

impl TopologyDiscoverer {
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<Registry>) -> Self {
        Self {
            transport,
            registry,
        }
    }

    pub async fn discover(&self) -> Result<DiscoveryReport, ClusterError> {
        let reachable = self.registry.list_reachable();
        if reachable.is_empty() {
            return Err(ClusterError::NoReachableNodes);
        }

        let mut report = DiscoveryReport::default();

        for node in reachable {
            let view = match self.transport.topology(&node).await {
                Ok(view) => view,
                Err(e) => {
                    tracing::warn!(
                        "Failed to get topology from {} at {}: {}",
                        node.id,
                        node.url(),
                        e
                    );
                    report.failures.push(node.id.clone(), e);
                    continue;
                }
            };

            tracing::debug!(
                "Node {} declares topology {} with {} members",
                node.id,
                view.hash,
                view.members.len()
            );

            self.merge_view(&node, &view, &mut report);
            report.answered += 1;
        }

        if report.answered == 0 {
            return Err(ClusterError::Discovery(report.failures));
        }

        if !report.failures.is_empty() {
            tracing::warn!("Topology discovery partially failed: {}", report.failures);
        }

        tracing::info!(
            "Discovery done: {} answered, {} new, {} updated, cluster size now {}",
            report.answered,
            report.inserted,
            report.updated,
            self.registry.len()
        );

        Ok(report)
    }

    fn merge_view(&self, source: &Node, view: &TopologyView, report: &mut DiscoveryReport) {
        for member in &view.members {
            let node = match Node::from_host_port(
                member.node_id(),
                &member.address,
                member.api_port,
                view.hash.clone(),
            ) {
                Ok(node) => node,
                Err(e) => {
                    // Not a failure of the pass; the node still answered.
                    tracing::warn!(
                        "Node {} declared member {} with invalid address {}:{}: {}",
                        source.id,
                        member.id,
                        member.address,
                        member.api_port,
                        e
                    );
                    continue;
                }
            };

            if node.id.is_empty() {
                tracing::warn!("Node {} declared a member without identity", source.id);
                continue;
            }

            match self.registry.merge(node) {
                MergeOutcome::Inserted => report.inserted += 1,
                MergeOutcome::Updated => report.updated += 1,
            }
        }
    }
}
