use std::sync::Arc;
use url::Url;

use super::discovery::{DiscoveryReport, TopologyDiscoverer};
use super::prober::HealthProber;
use super::refresher::{Refresher, RefresherHandle};
use super::registry::Registry;
use super::types::{Node, NodeId};
use crate::config::ClientConfig;
use crate::error::ClusterError;
use crate::transport::{HttpTransport, Transport};

/// Cluster-aware client handle.
///
/// Owns the registry and the background refresher. Data-plane code reads
/// [`ClusterClient::list_reachable`] to pick a node and reports back through
/// [`ClusterClient::activate`] / [`ClusterClient::deactivate`].
pub struct ClusterClient {
    config: ClientConfig,
    registry: Arc<Registry>,
    discoverer: TopologyDiscoverer,
    refresher: Option<RefresherHandle>,
}

impl ClusterClient {
    /// Connects to the cluster through the given seed addresses using the
    /// default configuration and an HTTP transport.
    pub async fn new<S: AsRef<str>>(seeds: &[S]) -> Result<Self, ClusterError> {
        Self::with_config(ClientConfig::default(), seeds).await
    }

    pub async fn with_config<S: AsRef<str>>(
        config: ClientConfig,
        seeds: &[S],
    ) -> Result<Self, ClusterError> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport, seeds).await
    }

    /// Bootstraps the client:
    ///
    /// 1. Parses each seed and resolves its identity with a state call.
    ///    Seeds that fail either step are logged and skipped.
    /// 2. Tracks the resolved seeds as reachable.
    /// 3. Starts the refresher.
    /// 4. Runs one discovery pass; its failure fails construction.
    pub async fn with_transport<S: AsRef<str>>(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        seeds: &[S],
    ) -> Result<Self, ClusterError> {
        let registry = Registry::new();

        for seed in seeds {
            let Some(node) = resolve_seed(transport.as_ref(), seed.as_ref()).await else {
                continue;
            };

            let id = node.id.clone();
            registry.add([node]);
            registry.activate([&id]);
        }

        tracing::info!(
            "Bootstrapped {} of {} seed node(s)",
            registry.len(),
            seeds.len()
        );

        let prober = Arc::new(HealthProber::new(
            transport.clone(),
            config.liveness_threshold,
        ));
        let refresher = Refresher::new(prober, registry.clone()).spawn(config.refresh_interval);
        let discoverer = TopologyDiscoverer::new(transport, registry.clone());

        let client = Self {
            config,
            registry,
            discoverer,
            refresher: Some(refresher),
        };

        let discovered = client.discover().await;
        if let Err(e) = discovered {
            tracing::error!("Failed to discover nodes: {}", e);
            client.shutdown().await;
            return Err(e);
        }

        Ok(client)
    }

    /// Re-runs topology discovery against every reachable node.
    pub async fn discover(&self) -> Result<DiscoveryReport, ClusterError> {
        self.discoverer.discover().await
    }

    pub fn list_reachable(&self) -> Vec<Arc<Node>> {
        self.registry.list_reachable()
    }

    pub fn list_unreachable(&self) -> Vec<Arc<Node>> {
        self.registry.list_unreachable()
    }

    pub fn add(&self, nodes: impl IntoIterator<Item = Node>) -> usize {
        self.registry.add(nodes)
    }

    pub fn activate<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> usize {
        self.registry.activate(ids)
    }

    pub fn deactivate<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> usize {
        self.registry.deactivate(ids)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Stops the refresher and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.shutdown().await;
        }
    }
}

async fn resolve_seed(transport: &dyn Transport, address: &str) -> Option<Node> {
    let url = match Url::parse(address) {
        Ok(url) => url,
        Err(source) => {
            let e = ClusterError::AddressParse {
                address: address.to_string(),
                source,
            };
            tracing::warn!("Failed to bootstrap state of node: {}", e);
            return None;
        }
    };

    let seed = Node::unresolved(url);
    match transport.state(&seed).await {
        Ok(state) if !state.identity.is_empty() => {
            tracing::info!("Seed {} is node {}", seed.url(), state.identity);
            Some(seed.with_identity(NodeId(state.identity), state.current))
        }
        Ok(_) => {
            tracing::warn!("Seed {} reported an empty identity", seed.url());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to bootstrap state of node {}: {}", seed.url(), e);
            None
        }
    }
}
