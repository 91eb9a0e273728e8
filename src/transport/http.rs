use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::Transport;
use super::protocol::{
    ENDPOINT_GOSSIP, ENDPOINT_STATE, GossipEntry, StateResponse, TopologyView, topology_path,
};
use crate::config::ClientConfig;
use crate::error::{ClusterError, TransportError};
use crate::membership::types::Node;

/// JSON-over-HTTP transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client whose timeouts come from `config`, so no call can
    /// block longer than `request_timeout`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClusterError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClusterError::HttpClient)?;

        Ok(Self { http_client })
    }

    /// Wraps an existing client. Its own timeout settings apply.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        node: &Node,
        path: &str,
    ) -> Result<T, TransportError> {
        let url = node.endpoint(path).map_err(|source| TransportError::Endpoint {
            base: node.url().to_string(),
            source,
        })?;

        tracing::trace!("GET {}", url);

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn state(&self, node: &Node) -> Result<StateResponse, TransportError> {
        self.get_json(node, ENDPOINT_STATE).await
    }

    async fn gossip(&self, node: &Node) -> Result<Vec<GossipEntry>, TransportError> {
        self.get_json(node, ENDPOINT_GOSSIP).await
    }

    async fn topology(&self, node: &Node) -> Result<TopologyView, TransportError> {
        self.get_json(node, &topology_path(node.topology())).await
    }
}
