//! Node Transport Module
//!
//! The remote calls the tracker makes against a single node. Every call is a
//! plain request/response with no retries; failures are reported to the
//! caller, which decides how they affect the node's classification.
//!
//! ## Submodules
//! - **`protocol`**: Endpoint paths and the JSON payloads nodes answer with.
//! - **`http`**: The `reqwest`-backed implementation used in production.

pub mod http;
pub mod protocol;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::membership::types::Node;
use protocol::{GossipEntry, StateResponse, TopologyView};

pub use http::HttpTransport;

/// Remote calls consumed by the tracker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Identity and current topology version of the node.
    async fn state(&self, node: &Node) -> Result<StateResponse, TransportError>;

    /// The node's view of how stale each of its peers is.
    async fn gossip(&self, node: &Node) -> Result<Vec<GossipEntry>, TransportError>;

    /// Full membership as declared by the node's current topology.
    async fn topology(&self, node: &Node) -> Result<TopologyView, TransportError>;
}
