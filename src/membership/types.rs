use std::fmt;
use url::Url;

/// Opaque, cluster-assigned identity of a node.
///
/// Empty until the node has answered a state query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reachability classification of a node held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Reachable,
    Unreachable,
}

/// A single member of the cluster.
///
/// Values are immutable snapshots. When discovery learns a new address or
/// topology version for a node, the registry publishes a fresh `Node` in
/// place of the old one; holders of the old snapshot keep a consistent view.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    url: Url,
    topology: String,
}

impl Node {
    pub fn new(id: NodeId, url: Url, topology: impl Into<String>) -> Self {
        Self {
            id,
            url,
            topology: topology.into(),
        }
    }

    /// A node known only by address, before its identity is resolved.
    pub fn unresolved(url: Url) -> Self {
        Self::new(NodeId::default(), url, String::new())
    }

    /// Builds the plain-http address a topology declares for a member.
    /// IPv6 literals may be given with or without brackets.
    pub fn from_host_port(
        id: NodeId,
        host: &str,
        port: u16,
        topology: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let url = if host.contains(':') && !host.starts_with('[') {
            Url::parse(&format!("http://[{}]:{}", host, port))?
        } else {
            Url::parse(&format!("http://{}:{}", host, port))?
        };
        Ok(Self::new(id, url, topology))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hash of the topology this node last reported as current.
    pub fn topology(&self) -> &str {
        &self.topology
    }

    /// Resolves `path` against the node's base address.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.url.join(path)
    }

    /// Returns a copy with the identity and topology a state call reported.
    pub fn with_identity(&self, id: NodeId, topology: impl Into<String>) -> Self {
        Self::new(id, self.url.clone(), topology)
    }
}
