//! Node Registry
//!
//! The tracker's single source of truth: one concurrent map from node
//! identifier to the latest node snapshot and its reachability status.
//!
//! Keying by identifier means a node can only ever be in one place, moves
//! are compare-and-set on the status field, and a stale `Node` obtained
//! before a topology update still addresses the right entry.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use super::types::{Node, NodeId, NodeStatus};

#[derive(Debug, Clone)]
struct RegistryEntry {
    node: Arc<Node>,
    status: NodeStatus,
}

/// Outcome of merging a topology member into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The identifier was unknown and is now tracked as reachable.
    Inserted,
    /// The identifier was known; its address and topology were replaced.
    Updated,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<NodeId, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Starts tracking `nodes` as unreachable.
    ///
    /// A node whose identifier is already tracked replaces the stored
    /// snapshot but keeps its status. Nodes without an identifier cannot be
    /// keyed and are skipped. Returns how many new entries were created.
    pub fn add(&self, nodes: impl IntoIterator<Item = Node>) -> usize {
        let mut added = 0;

        for node in nodes {
            if node.id.is_empty() {
                tracing::warn!("Skipping node at {} with unresolved identity", node.url());
                continue;
            }

            match self.entries.entry(node.id.clone()) {
                Entry::Occupied(mut existing) => {
                    existing.get_mut().node = Arc::new(node);
                }
                Entry::Vacant(vacant) => {
                    tracing::debug!("Tracking node {} at {}", node.id, node.url());
                    vacant.insert(RegistryEntry {
                        node: Arc::new(node),
                        status: NodeStatus::Unreachable,
                    });
                    added += 1;
                }
            }
        }

        added
    }

    /// Marks the given nodes reachable. Returns how many actually moved.
    pub fn activate<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> usize {
        self.move_to(ids, NodeStatus::Reachable)
    }

    /// Marks the given nodes unreachable. Returns how many actually moved.
    pub fn deactivate<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> usize {
        self.move_to(ids, NodeStatus::Unreachable)
    }

    fn move_to<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>, target: NodeStatus) -> usize {
        let mut moved = 0;

        for id in ids {
            match self.entries.get_mut(id) {
                Some(mut entry) if entry.status != target => {
                    entry.status = target;
                    moved += 1;
                    tracing::info!("Node {} at {} is now {:?}", id, entry.node.url(), target);
                }
                Some(_) => {}
                None => {
                    tracing::debug!("Ignoring status change for unknown node {}", id);
                }
            }
        }

        moved
    }

    /// Publishes a topology member.
    ///
    /// Known identifiers get a fresh snapshot carrying the new address and
    /// topology version; status is untouched. Unknown identifiers are
    /// inserted as reachable, since a reachable node vouched for them.
    pub fn merge(&self, node: Node) -> MergeOutcome {
        match self.entries.entry(node.id.clone()) {
            Entry::Occupied(mut existing) => {
                let current = &existing.get().node;
                if current.url() != node.url() || current.topology() != node.topology() {
                    tracing::debug!(
                        "Updating {}: {} ({}) -> {} ({})",
                        node.id,
                        current.url(),
                        current.topology(),
                        node.url(),
                        node.topology()
                    );
                    existing.get_mut().node = Arc::new(node);
                }
                MergeOutcome::Updated
            }
            Entry::Vacant(vacant) => {
                tracing::info!("Discovered new node {} at {}", node.id, node.url());
                vacant.insert(RegistryEntry {
                    node: Arc::new(node),
                    status: NodeStatus::Reachable,
                });
                MergeOutcome::Inserted
            }
        }
    }

    pub fn list_reachable(&self) -> Vec<Arc<Node>> {
        self.list(NodeStatus::Reachable)
    }

    pub fn list_unreachable(&self) -> Vec<Arc<Node>> {
        self.list(NodeStatus::Unreachable)
    }

    /// Snapshot of every node with the given status, ordered by identifier.
    fn list(&self, status: NodeStatus) -> Vec<Arc<Node>> {
        let mut nodes: Vec<Arc<Node>> = self
            .entries
            .iter()
            .filter(|entry| entry.value().status == status)
            .map(|entry| entry.value().node.clone())
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    pub fn get(&self, id: &NodeId) -> Option<Arc<Node>> {
        self.entries.get(id).map(|entry| entry.node.clone())
    }

    pub fn status(&self, id: &NodeId) -> Option<NodeStatus> {
        self.entries.get(id).map(|entry| entry.status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
