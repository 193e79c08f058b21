//! Single-node HTTP flows: registration, signing, direct authentication and
//! challenge–response authentication.

use crate::test_utils::{get_json, post_json, register, spawn_node_with_peers};
use serde_json::json;

#[tokio::test]
async fn test_register_sign_authenticate_over_http() {
    let node = spawn_node_with_peers("node-5001", Vec::new()).await;
    let client = reqwest::Client::new();

    let body = register(&client, &node, "bob").await;
    assert_eq!(body["message"], "Registration successful.");
    assert_eq!(body["username"], "bob");
    let public_key = body["public_key"].as_str().unwrap().to_string();
    assert_eq!(public_key.len(), 64);

    let (status, body) = post_json(
        &client,
        &node.url("/sign"),
        json!({ "username": "bob", "message": "hello" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Signature generated.");
    assert_eq!(body["username"], "bob");
    let signature = body["signature"].as_str().unwrap().to_string();
    assert_eq!(signature.len(), 64);

    let (status, body) = post_json(
        &client,
        &node.url("/authenticate"),
        json!({ "username": "bob", "message": "hello", "signature": signature }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Authentication successful.");

    let (status, body) = get_json(&client, &node.url("/chain")).await;
    assert_eq!(status, 200);
    assert_eq!(body["length"], 3);
    assert_eq!(body["chain"][1]["data"]["action"], "registration");
    assert_eq!(body["chain"][1]["data"]["public_key"], public_key.as_str());
    assert_eq!(body["chain"][2]["data"]["action"], "authentication");
    assert_eq!(body["chain"][2]["previous_hash"], body["chain"][1]["hash"]);

    let (_, body) = get_json(&client, &node.url("/validate")).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["length"], 3);
}

#[tokio::test]
async fn test_rejections_over_http() {
    let node = spawn_node_with_peers("node-5001", Vec::new()).await;
    let client = reqwest::Client::new();

    register(&client, &node, "bob").await;

    let (status, body) = post_json(
        &client,
        &node.url("/register"),
        json!({ "username": "bob" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "User already registered.");

    let (status, body) = post_json(
        &client,
        &node.url("/authenticate"),
        json!({ "username": "bob", "message": "hello", "signature": "garbage" }),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Authentication failed.");

    let (status, body) = post_json(
        &client,
        &node.url("/authenticate"),
        json!({ "username": "alice", "message": "hello", "signature": "00" }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "User not found.");

    let (status, _) = post_json(
        &client,
        &node.url("/challenge"),
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(status, 404);

    assert_eq!(node.chain_len(), 2);
}

#[tokio::test]
async fn test_challenge_response_over_http() {
    let node = spawn_node_with_peers("node-5001", Vec::new()).await;
    let client = reqwest::Client::new();
    register(&client, &node, "bob").await;

    let (status, body) = post_json(
        &client,
        &node.url("/challenge"),
        json!({ "username": "bob" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Challenge generated.");
    let challenge = body["challenge"].as_str().unwrap().to_string();
    assert_eq!(challenge.len(), 32);

    let (_, body) = post_json(
        &client,
        &node.url("/sign"),
        json!({ "username": "bob", "message": challenge }),
    )
    .await;
    let signature = body["signature"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &client,
        &node.url("/verify"),
        json!({ "username": "bob", "signature": signature }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Zero-Knowledge Authentication successful.");

    let (status, body) = post_json(
        &client,
        &node.url("/verify"),
        json!({ "username": "bob", "signature": signature }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "User or challenge not found.");

    let (_, body) = get_json(&client, &node.url("/chain")).await;
    assert_eq!(body["length"], 3);
    assert_eq!(body["chain"][2]["data"]["action"], "zk_authentication");
    assert_eq!(body["chain"][2]["data"]["challenge"], challenge.as_str());
}

#[tokio::test]
async fn test_failed_challenge_response_over_http() {
    let node = spawn_node_with_peers("node-5001", Vec::new()).await;
    let client = reqwest::Client::new();
    register(&client, &node, "bob").await;

    post_json(
        &client,
        &node.url("/challenge"),
        json!({ "username": "bob" }),
    )
    .await;

    let (status, body) = post_json(
        &client,
        &node.url("/verify"),
        json!({ "username": "bob", "signature": "garbage" }),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Zero-Knowledge Authentication failed.");
    assert_eq!(node.chain_len(), 2);
}

#[tokio::test]
async fn test_welcome_and_health() {
    let node = spawn_node_with_peers("node-7", Vec::new()).await;
    let client = reqwest::Client::new();

    let text = client
        .get(node.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("node-7"));

    let (status, body) = get_json(&client, &node.url("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["service"], "authchain-node");
    assert_eq!(body["node_id"], "node-7");
}
