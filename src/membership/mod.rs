//! Membership & Topology Module
//!
//! Tracks which nodes make up the cluster and whether each one is currently
//! reachable. The view is local, best-effort and built purely by polling the
//! nodes' own HTTP APIs.
//!
//! ## Core Mechanisms
//! - **Registry**: One keyed map from node identifier to its latest snapshot and status.
//! - **Health Probing**: A node is alive when its own gossip reports it heard from itself recently.
//! - **Refresher**: A cancellable background loop re-probing every node on a fixed interval.
//! - **Discovery**: Reachable nodes are asked for their topology; new members are added, known ones updated.

pub mod discovery;
pub mod prober;
pub mod refresher;
pub mod registry;
pub mod service;
pub mod types;
