//! End-to-end tests against real HTTP fake nodes.
//!
//! Each fake node is a small axum server on 127.0.0.1 answering the state,
//! gossip and topology endpoints from shared, mutable settings, so a test
//! can make a node stale, unhealthy or change its topology mid-run.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tsdb_membership::membership::prober::HealthProber;
use tsdb_membership::membership::refresher::Refresher;
use tsdb_membership::{
    ClientConfig, ClusterClient, ClusterError, HttpTransport, Node, NodeId, NodeStatus, Registry,
    Transport, TransportError,
};
use url::Url;

// ============================================================
// FAKE NODE
// ============================================================

#[derive(Debug, Clone)]
struct Settings {
    identity: String,
    current: String,
    gossip_age: f64,
    members: Vec<Value>,
    healthy: bool,
    garbage: bool,
}

type Shared = Arc<Mutex<Settings>>;

struct FakeNode {
    addr: SocketAddr,
    settings: Shared,
    task: JoinHandle<()>,
}

impl FakeNode {
    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn member(&self) -> Value {
        let settings = self.settings.lock().unwrap();
        json!({
            "id": settings.identity,
            "address": self.addr.ip().to_string(),
            "apiport": self.addr.port(),
        })
    }

    fn node(&self) -> Node {
        let settings = self.settings.lock().unwrap();
        Node::from_host_port(
            NodeId::from(settings.identity.as_str()),
            &self.addr.ip().to_string(),
            self.addr.port(),
            settings.current.clone(),
        )
        .unwrap()
    }

    fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut settings = self.settings.lock().unwrap();
        f(&mut *settings);
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn unavailable() -> (StatusCode, Json<Value>) {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
}

async fn handle_state(State(settings): State<Shared>) -> (StatusCode, Json<Value>) {
    let s = settings.lock().unwrap().clone();
    if !s.healthy {
        return unavailable();
    }
    if s.garbage {
        return (StatusCode::OK, Json(json!("not a state document")));
    }
    (
        StatusCode::OK,
        Json(json!({ "identity": s.identity, "current": s.current })),
    )
}

async fn handle_gossip(State(settings): State<Shared>) -> (StatusCode, Json<Value>) {
    let s = settings.lock().unwrap().clone();
    if !s.healthy {
        return unavailable();
    }
    (
        StatusCode::OK,
        Json(json!([
            { "id": s.identity, "gossip_time": 1545162331.0, "gossip_age": s.gossip_age }
        ])),
    )
}

async fn handle_topology(
    State(settings): State<Shared>,
    Path(hash): Path<String>,
) -> (StatusCode, Json<Value>) {
    let s = settings.lock().unwrap().clone();
    if !s.healthy || hash != s.current {
        return unavailable();
    }
    (
        StatusCode::OK,
        Json(json!({ "hash": s.current, "nodes": s.members })),
    )
}

async fn spawn_node(identity: &str, gossip_age: f64) -> anyhow::Result<FakeNode> {
    let settings: Shared = Arc::new(Mutex::new(Settings {
        identity: identity.to_string(),
        current: "topo-1".to_string(),
        gossip_age,
        members: vec![],
        healthy: true,
        garbage: false,
    }));

    let app = Router::new()
        .route("/state", get(handle_state))
        .route("/gossip/json", get(handle_gossip))
        .route("/topology/json/:hash", get(handle_topology))
        .with_state(settings.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(FakeNode {
        addr,
        settings,
        task,
    })
}

/// An address nothing listens on.
fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_config() -> ClientConfig {
    ClientConfig::default()
        .with_request_timeout(Duration::from_secs(2))
        .with_connect_timeout(Duration::from_millis(500))
}

async fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

fn ids(nodes: &[Arc<Node>]) -> Vec<String> {
    nodes.iter().map(|n| n.id.0.clone()).collect()
}

// ============================================================
// CONSTRUCTION & DISCOVERY
// ============================================================

#[tokio::test]
async fn test_client_discovers_peers_from_seed() -> anyhow::Result<()> {
    init_tracing();

    // ARRANGE: a knows about b, the client only knows a
    let a = spawn_node("node-a", 0.0).await?;
    let b = spawn_node("node-b", 0.0).await?;
    let members = vec![a.member(), b.member()];
    a.update(|s| s.members = members);

    // ACT
    let client = ClusterClient::with_config(test_config(), &[a.url()]).await?;

    // ASSERT
    assert_eq!(ids(&client.list_reachable()), vec!["node-a", "node-b"]);
    let discovered = client.registry().get(&NodeId::from("node-b")).unwrap();
    assert_eq!(
        discovered.url().as_str(),
        format!("http://127.0.0.1:{}/", b.addr.port())
    );
    assert_eq!(discovered.topology(), "topo-1");

    client.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_client_drops_malformed_and_refused_seeds() -> anyhow::Result<()> {
    let a = spawn_node("node-a", 0.0).await?;
    let member = a.member();
    a.update(|s| s.members = vec![member]);

    let client = ClusterClient::with_config(
        test_config(),
        &[a.url(), "not a url".to_string(), refused_url()],
    )
    .await?;

    let mut known = ids(&client.list_reachable());
    known.extend(ids(&client.list_unreachable()));
    assert_eq!(known, vec!["node-a"]);

    client.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_client_fails_when_no_seed_answers() {
    let result = ClusterClient::with_config(test_config(), &[refused_url(), refused_url()]).await;

    assert!(matches!(result, Err(ClusterError::NoReachableNodes)));
}

#[tokio::test]
async fn test_rediscovery_fails_when_all_nodes_are_down() -> anyhow::Result<()> {
    // ARRANGE: long refresh interval so only discovery touches the registry
    let a = spawn_node("node-a", 0.0).await?;
    let b = spawn_node("node-b", 0.0).await?;
    let members = vec![a.member(), b.member()];
    a.update(|s| s.members = members);

    let config = test_config().with_refresh_interval(Duration::from_secs(3600));
    let client = ClusterClient::with_config(config, &[a.url()]).await?;
    let before = client.list_reachable();

    a.update(|s| s.healthy = false);
    b.update(|s| s.healthy = false);

    // ACT
    let result = client.discover().await;

    // ASSERT
    match result {
        Err(ClusterError::Discovery(errors)) => {
            assert_eq!(errors.len(), 2);
            for failure in errors.failures() {
                assert!(matches!(failure.error, TransportError::Status { .. }));
            }
        }
        other => panic!("expected aggregated discovery error, got {:?}", other),
    }
    let after = client.list_reachable();
    assert_eq!(ids(&after), ids(&before));
    assert!(client.list_unreachable().is_empty());

    client.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_rediscovery_picks_up_moved_node() -> anyhow::Result<()> {
    let a = spawn_node("node-a", 0.0).await?;
    let b = spawn_node("node-b", 0.0).await?;
    let members = vec![a.member(), b.member()];
    a.update(|s| s.members = members);

    let config = test_config().with_refresh_interval(Duration::from_secs(3600));
    let client = ClusterClient::with_config(config, &[a.url()]).await?;

    // node-b restarts on another port and a publishes a new topology
    let b2 = spawn_node("node-b", 0.0).await?;
    let members = vec![a.member(), b2.member()];
    a.update(|s| s.members = members);

    client.discover().await?;

    let moved = client.registry().get(&NodeId::from("node-b")).unwrap();
    assert_eq!(moved.id, NodeId::from("node-b"));
    assert_eq!(moved.url().port(), Some(b2.addr.port()));
    assert_eq!(client.registry().len(), 2);

    client.shutdown().await;
    Ok(())
}

// ============================================================
// HEALTH PROBING OVER HTTP
// ============================================================

#[tokio::test]
async fn test_liveness_boundary_over_http() -> anyhow::Result<()> {
    let at_threshold = spawn_node("edge", 10.0).await?;
    let just_past = spawn_node("stale", 10.0001).await?;
    let transport = Arc::new(HttpTransport::new(&test_config())?);
    let prober = HealthProber::new(transport, 10.0);

    assert!(prober.is_alive(&at_threshold.node()).await);
    assert!(!prober.is_alive(&just_past.node()).await);
    Ok(())
}

#[tokio::test]
async fn test_prober_over_caller_supplied_client() -> anyhow::Result<()> {
    let node = spawn_node("custom", 1.0).await?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;
    let transport = Arc::new(HttpTransport::from_client(http_client));
    let prober = HealthProber::new(transport, 10.0);

    assert!(prober.is_alive(&node.node()).await);

    node.update(|s| s.healthy = false);
    assert!(!prober.is_alive(&node.node()).await);
    Ok(())
}

#[tokio::test]
async fn test_refresher_tick_against_live_and_refused_nodes() -> anyhow::Result<()> {
    // ARRANGE: one healthy node, one address that refuses connections
    let live = spawn_node("live", 0.0).await?;
    let dead = Node::new(
        NodeId::from("dead"),
        Url::parse(&refused_url())?,
        "topo-1",
    );

    let registry = Registry::new();
    registry.add([live.node(), dead.clone()]);
    registry.activate([&dead.id]);

    let transport = Arc::new(HttpTransport::new(&test_config())?);
    let prober = Arc::new(HealthProber::new(transport, 10.0));
    let refresher = Refresher::new(prober, registry.clone());

    // ACT
    refresher.tick().await;

    // ASSERT
    assert_eq!(registry.status(&NodeId::from("live")), Some(NodeStatus::Reachable));
    assert_eq!(registry.status(&dead.id), Some(NodeStatus::Unreachable));
    Ok(())
}

#[tokio::test]
async fn test_background_refresh_follows_node_health() -> anyhow::Result<()> {
    init_tracing();

    let a = spawn_node("node-a", 0.0).await?;
    let b = spawn_node("node-b", 0.0).await?;
    let members = vec![a.member(), b.member()];
    a.update(|s| s.members = members);

    let config = test_config().with_refresh_interval(Duration::from_millis(50));
    let client = ClusterClient::with_config(config, &[a.url()]).await?;
    let node_b = NodeId::from("node-b");

    // b stops refreshing its own gossip
    b.update(|s| s.gossip_age = 60.0);
    let demoted = wait_for(
        || client.registry().status(&node_b) == Some(NodeStatus::Unreachable),
        Duration::from_secs(5),
    )
    .await;
    assert!(demoted, "node-b should have been deactivated");

    b.update(|s| s.gossip_age = 0.5);
    let promoted = wait_for(
        || client.registry().status(&node_b) == Some(NodeStatus::Reachable),
        Duration::from_secs(5),
    )
    .await;
    assert!(promoted, "node-b should have been reactivated");

    client.shutdown().await;
    Ok(())
}

// ============================================================
// TRANSPORT FAILURE MAPPING
// ============================================================

#[tokio::test]
async fn test_error_status_and_bad_body() -> anyhow::Result<()> {
    let node = spawn_node("n", 0.0).await?;
    let transport = HttpTransport::new(&test_config())?;

    node.update(|s| s.healthy = false);
    let result = transport.state(&node.node()).await;
    match result {
        Err(TransportError::Status { status, .. }) => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
        }
        other => panic!("expected status error, got {:?}", other),
    }

    node.update(|s| {
        s.healthy = true;
        s.garbage = true;
    });
    let result = transport.state(&node.node()).await;
    assert!(matches!(result, Err(TransportError::Decode { .. })));
    Ok(())
}
