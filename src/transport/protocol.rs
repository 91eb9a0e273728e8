//! Node Protocol Definitions
//!
//! Endpoint paths and the JSON payloads a node answers with. These are the
//! only parts of a node's API the membership tracker needs.

use serde::{Deserialize, Serialize};

use crate::membership::types::NodeId;

// --- API Endpoints ---

/// Identity and current topology of the queried node.
pub const ENDPOINT_STATE: &str = "/state";
/// Per-peer gossip ages as seen by the queried node.
pub const ENDPOINT_GOSSIP: &str = "/gossip/json";
/// Topology declaration; the topology hash is appended as the last segment.
pub const ENDPOINT_TOPOLOGY: &str = "/topology/json";

pub fn topology_path(hash: &str) -> String {
    format!("{}/{}", ENDPOINT_TOPOLOGY, hash)
}

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateResponse {
    pub identity: String,
    /// Hash of the topology the node is currently serving.
    pub current: String,
}

/// How long ago the queried node last heard from one peer.
///
/// The age is reported by the cluster as a bare number; it is compared as-is
/// against the liveness threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GossipEntry {
    pub id: String,
    #[serde(rename = "gossip_age")]
    pub age: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologyMember {
    pub id: String,
    /// Host name or IP the member serves its API on.
    pub address: String,
    #[serde(rename = "apiport")]
    pub api_port: u16,
}

impl TopologyMember {
    pub fn node_id(&self) -> NodeId {
        NodeId(self.id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologyView {
    pub hash: String,
    #[serde(rename = "nodes", default)]
    pub members: Vec<TopologyMember>,
}
