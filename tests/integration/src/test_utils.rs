//! Test utilities for multi-node integration tests

use authchain_core::Config;
use authchain_node::{build_router, AppState};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;

/// Peer call timeout used by test nodes
pub const TEST_PEER_TIMEOUT_MS: u64 = 1000;

/// A node served on an ephemeral local port
pub struct TestNode {
    pub base_url: String,
    pub state: AppState,
}

impl TestNode {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Local ledger length, read without going through HTTP
    pub fn chain_len(&self) -> usize {
        self.state.ledger().read().unwrap().len()
    }
}

/// Configuration for a test node listening on `listen_addr`
pub fn node_config(node_id: &str, listen_addr: &str, peers: Vec<String>) -> Config {
    let mut config = Config::default_config();
    config.node.node_id = node_id.to_string();
    config.node.listen_addr = listen_addr.to_string();
    config.peers.addresses = peers;
    config.peers.timeout_ms = TEST_PEER_TIMEOUT_MS;
    config
}

/// Serve `config` on an already bound listener.
pub fn serve_node(listener: TcpListener, config: &Config) -> TestNode {
    let addr = listener.local_addr().unwrap();
    let state = AppState::from_config(config).unwrap();
    let app = build_router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestNode {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Start one node per entry of `topology`; entry `i` lists the indices of
/// node `i`'s peers.
///
/// All listeners are bound before any node is built so every node knows its
/// peers' addresses up front.
pub async fn spawn_cluster(topology: &[Vec<usize>]) -> Vec<TestNode> {
    let mut listeners = Vec::with_capacity(topology.len());
    for _ in topology {
        listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
    }
    let addresses: Vec<String> = listeners
        .iter()
        .map(|l| format!("http://{}", l.local_addr().unwrap()))
        .collect();

    listeners
        .into_iter()
        .zip(topology)
        .enumerate()
        .map(|(i, (listener, peers))| {
            let listen_addr = listener.local_addr().unwrap().to_string();
            let peer_addresses = peers.iter().map(|&p| addresses[p].clone()).collect();
            let config = node_config(&format!("node-{}", i), &listen_addr, peer_addresses);
            serve_node(listener, &config)
        })
        .collect()
}

/// Start a single node with an explicit peer list.
pub async fn spawn_node_with_peers(node_id: &str, peers: Vec<String>) -> TestNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listen_addr = listener.local_addr().unwrap().to_string();
    serve_node(listener, &node_config(node_id, &listen_addr, peers))
}

/// POST `body` as JSON and return the status code and JSON body.
pub async fn post_json(client: &reqwest::Client, url: &str, body: Value) -> (u16, Value) {
    let response = client.post(url).json(&body).send().await.unwrap();
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// GET `url` and return the status code and JSON body.
pub async fn get_json(client: &reqwest::Client, url: &str) -> (u16, Value) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Register `username` on `node`, asserting success.
pub async fn register(client: &reqwest::Client, node: &TestNode, username: &str) -> Value {
    let (status, body) = post_json(
        client,
        &node.url("/register"),
        json!({ "username": username }),
    )
    .await;
    assert_eq!(status, 200, "registration of {} failed: {}", username, body);
    body
}

/// Poll `node` until its chain reaches `expected` blocks.
pub async fn wait_for_chain_len(node: &TestNode, expected: usize) -> bool {
    for _ in 0..100 {
        if node.chain_len() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
