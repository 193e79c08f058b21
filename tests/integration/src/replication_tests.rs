//! Multi-node tests: block propagation and longest-chain consensus.

use crate::test_utils::{
    get_json, node_config, post_json, register, serve_node, spawn_cluster,
    spawn_node_with_peers, wait_for_chain_len,
};
use authchain_core::{Block, IdentityEvent, Ledger};
use authchain_mesh::ChainResponse;
use axum::{routing::get, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocks_propagate_to_all_peers() {
    let nodes = spawn_cluster(&[vec![1, 2], vec![0, 2], vec![0, 1]]).await;
    let client = reqwest::Client::new();

    register(&client, &nodes[0], "alice").await;
    for node in &nodes {
        assert!(wait_for_chain_len(node, 2).await, "{} did not sync", node.base_url);
    }

    let (_, body) = post_json(
        &client,
        &nodes[0].url("/sign"),
        json!({ "username": "alice", "message": "hello" }),
    )
    .await;
    let (status, _) = post_json(
        &client,
        &nodes[0].url("/authenticate"),
        json!({ "username": "alice", "message": "hello", "signature": body["signature"] }),
    )
    .await;
    assert_eq!(status, 200);

    for node in &nodes {
        assert!(wait_for_chain_len(node, 3).await, "{} did not sync", node.base_url);
    }

    let (_, origin) = get_json(&client, &nodes[0].url("/chain")).await;
    for node in &nodes[1..] {
        let (_, replica) = get_json(&client, &node.url("/chain")).await;
        assert_eq!(replica["chain"], origin["chain"]);
    }

    assert_eq!(nodes[0].state.sync.metrics().push_failures_total, 0);
    assert_eq!(nodes[1].state.sync.metrics().blocks_received_total, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_back_to_back_blocks_arrive_in_order() {
    let nodes = spawn_cluster(&[vec![1], vec![]]).await;
    let client = reqwest::Client::new();

    for i in 0..10 {
        register(&client, &nodes[0], &format!("user-{}", i)).await;
    }

    assert!(wait_for_chain_len(&nodes[1], 11).await, "replica fell behind");

    let (_, origin) = get_json(&client, &nodes[0].url("/chain")).await;
    let (_, replica) = get_json(&client, &nodes[1].url("/chain")).await;
    assert_eq!(replica["chain"], origin["chain"]);

    let stats = nodes[1].state.sync.metrics();
    assert_eq!(stats.blocks_received_total, 10);
    assert_eq!(stats.blocks_rejected_total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_peers_only_hold_blocks_not_identities() {
    let nodes = spawn_cluster(&[vec![1], vec![]]).await;
    let client = reqwest::Client::new();

    register(&client, &nodes[0], "alice").await;
    assert!(wait_for_chain_len(&nodes[1], 2).await);

    let (status, _) = post_json(
        &client,
        &nodes[1].url("/sign"),
        json!({ "username": "alice", "message": "hello" }),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_consensus_adopts_longer_peer_chain() {
    let nodes = spawn_cluster(&[vec![1], vec![]]).await;
    let client = reqwest::Client::new();

    register(&client, &nodes[1], "alice").await;
    register(&client, &nodes[1], "bob").await;
    assert_eq!(nodes[0].chain_len(), 1);

    let (status, body) = get_json(&client, &nodes[0].url("/consensus")).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Consensus complete.");
    assert_eq!(body["length"], 3);
    assert_eq!(body["replaced"], true);
    assert_eq!(body["source"], nodes[1].base_url.as_str());

    let (_, local) = get_json(&client, &nodes[0].url("/chain")).await;
    let (_, remote) = get_json(&client, &nodes[1].url("/chain")).await;
    assert_eq!(local["chain"], remote["chain"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_consensus_tie_keeps_local_chain() {
    let nodes = spawn_cluster(&[vec![1], vec![]]).await;
    let client = reqwest::Client::new();

    register(&client, &nodes[1], "alice").await;
    register(&client, &nodes[0], "bob").await;

    // The push of bob's block does not link to the peer's chain
    for _ in 0..100 {
        if nodes[1].state.sync.metrics().blocks_rejected_total == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(nodes[1].state.sync.metrics().blocks_rejected_total, 1);

    let (_, before) = get_json(&client, &nodes[0].url("/chain")).await;
    let (_, body) = get_json(&client, &nodes[0].url("/consensus")).await;
    assert_eq!(body["length"], 2);
    assert_eq!(body["replaced"], false);

    let (_, after) = get_json(&client, &nodes[0].url("/chain")).await;
    assert_eq!(before, after);
    assert_eq!(after["chain"][1]["data"]["username"], "bob");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_consensus_skips_unreachable_peer() {
    let source = spawn_node_with_peers("source", Vec::new()).await;
    let client = reqwest::Client::new();
    register(&client, &source, "alice").await;
    register(&client, &source, "bob").await;

    let node = spawn_node_with_peers(
        "node",
        vec!["http://127.0.0.1:1".to_string(), source.base_url.clone()],
    )
    .await;

    let (status, body) = get_json(&client, &node.url("/consensus")).await;
    assert_eq!(status, 200);
    assert_eq!(body["replaced"], true);
    assert_eq!(body["length"], 3);
    assert_eq!(body["peers_polled"], 2);
    assert_eq!(body["peers_unreachable"], 1);
}

/// Serves a fixed chain on `/chain`, standing in for a misbehaving peer.
async fn spawn_static_chain_peer(chain: Vec<Block>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = ChainResponse::from_chain(chain);
    let app = Router::new().route(
        "/chain",
        get(move || {
            let response = response.clone();
            async move { Json(response) }
        }),
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn tampered_chain() -> Vec<Block> {
    let mut ledger = Ledger::new();
    for username in ["mallory", "trudy", "eve"] {
        ledger.add_block(IdentityEvent::Registration {
            username: username.to_string(),
            public_key: "00".repeat(32),
        });
    }
    let mut chain = ledger.snapshot();
    chain[2].previous_hash = "f".repeat(64);
    chain
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_consensus_adopts_unvalidated_chain_by_default() {
    let peer = spawn_static_chain_peer(tampered_chain()).await;
    let node = spawn_node_with_peers("node", vec![peer]).await;
    let client = reqwest::Client::new();

    let (_, body) = get_json(&client, &node.url("/consensus")).await;
    assert_eq!(body["replaced"], true);
    assert_eq!(body["length"], 4);

    let (_, body) = get_json(&client, &node.url("/validate")).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_consensus_validation_rejects_tampered_chain() {
    let peer = spawn_static_chain_peer(tampered_chain()).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listen_addr = listener.local_addr().unwrap().to_string();
    let mut config = node_config("hardened", &listen_addr, vec![peer]);
    config.consensus.validate_candidates = true;
    let node = serve_node(listener, &config);
    let client = reqwest::Client::new();

    let (_, body) = get_json(&client, &node.url("/consensus")).await;
    assert_eq!(body["replaced"], false);
    assert_eq!(body["length"], 1);
    assert_eq!(body["peers_unreachable"], 0);
}

#[tokio::test]
async fn test_sync_block_rejects_unlinked_block() {
    let node = spawn_node_with_peers("node", Vec::new()).await;
    let client = reqwest::Client::new();

    let mut other = Ledger::new();
    other.add_block(IdentityEvent::Genesis);
    let unlinked = other.add_block(IdentityEvent::Registration {
        username: "mallory".to_string(),
        public_key: "00".repeat(32),
    });

    let (status, body) = post_json(
        &client,
        &node.url("/sync_block"),
        json!({ "block": unlinked }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Block rejected (hash mismatch)");
    assert_eq!(node.chain_len(), 1);
}

#[tokio::test]
async fn test_sync_block_accepts_next_block() {
    let node = spawn_node_with_peers("node", Vec::new()).await;
    let client = reqwest::Client::new();

    let mut other = Ledger::new();
    let next = other.add_block(IdentityEvent::Registration {
        username: "alice".to_string(),
        public_key: "00".repeat(32),
    });

    let (status, body) = post_json(
        &client,
        &node.url("/sync_block"),
        json!({ "block": next }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Block synced");
    assert_eq!(node.chain_len(), 2);
}
