//! Cluster Membership Client Library
//!
//! A cluster-aware client core for a distributed time-series store. It keeps
//! a local, continuously re-verified view of which nodes exist, which of them
//! are reachable, and where each one can be reached.
//!
//! ## Architecture Modules
//! - **`membership`**: Registry, health prober, background refresher and
//!   topology discovery, tied together by [`ClusterClient`].
//! - **`transport`**: The state, gossip and topology calls made against a single node.
//! - **`config`**: Timing and liveness settings.
//! - **`error`**: Typed errors, including the per-node failure aggregate.
//!
//! Issuing reads and writes is left to the caller, which picks among
//! [`ClusterClient::list_reachable`].

pub mod config;
pub mod error;
pub mod membership;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClusterError, MultiError, NodeFailure, TransportError};
pub use membership::discovery::DiscoveryReport;
pub use membership::registry::{MergeOutcome, Registry};
pub use membership::service::ClusterClient;
pub use membership::types::{Node, NodeId, NodeStatus};
pub use transport::{HttpTransport, Transport};
