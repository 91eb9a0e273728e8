//! Error types for the membership tracker.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

use crate::membership::types::NodeId;

/// Failure talking to a single node.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint for {base}: {source}")]
    Endpoint {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// One failed node in a fan-out operation.
#[derive(Debug)]
pub struct NodeFailure {
    pub node: NodeId,
    pub error: TransportError,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}: {}", self.node, self.error)
    }
}

/// Collects the per-node failures of a fan-out operation.
///
/// An empty `MultiError` means nothing failed; use [`MultiError::into_result`]
/// to turn it into a `Result` so an empty set is never reported as an error.
#[derive(Debug, Default)]
pub struct MultiError {
    failures: Vec<NodeFailure>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId, error: TransportError) {
        self.failures.push(NodeFailure { node, error });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[NodeFailure] {
        &self.failures
    }

    /// Identifiers of every node that failed, in the order they were recorded.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.failures.iter().map(|failure| &failure.node)
    }

    pub fn into_result(self) -> Result<(), MultiError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} node(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("invalid node address '{address}': {source}")]
    AddressParse {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no reachable nodes to discover topology from")]
    NoReachableNodes,

    #[error("topology discovery failed: {0}")]
    Discovery(#[source] MultiError),
}
