//! Endpoint rotation and double-submit protection under injected failures.

mod common;

use common::{
    dead_endpoint, hung_endpoint, recipient, relay_config, sender_address, MockChain, MockNode, Relay, TEST_MNEMONIC,
};
use serde_json::json;

const OSMO: u128 = 1_000_000;

fn funded_chain() -> std::sync::Arc<MockChain> {
    let chain = MockChain::new();
    chain.fund(&sender_address(), "uosmo", 100 * OSMO);
    chain
}

#[tokio::test]
async fn test_dead_primary_fails_over_to_secondary() {
    let dead = dead_endpoint().await;
    let node = MockNode::start(funded_chain()).await;
    let relay = Relay::start(relay_config(vec![dead.clone(), node.url.clone()])).await;

    let (_, health) = relay.get("/health").await;
    assert_eq!(health["rpc"], dead.as_str());
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["fallback_rpcs_available"], 1);

    let (status, body) = relay
        .post("/balance", json!({"address": sender_address()}))
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["balance"]["amount"], "100000000");

    // The pool stays on the endpoint that answered.
    let (_, health) = relay.get("/health").await;
    assert_eq!(health["rpc"], node.url.as_str());
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_unavailable_node_is_skipped_for_send() {
    let chain = funded_chain();
    let flaky = MockNode::start(chain.clone()).await;
    let healthy = MockNode::start(chain.clone()).await;
    flaky.fail_with(Some(503));

    let relay = Relay::start(relay_config(vec![flaky.url.clone(), healthy.url.clone()])).await;
    let to = recipient(1);

    let (status, body) = relay
        .post(
            "/send",
            json!({"sender_credential": TEST_MNEMONIC, "recipient_address": to, "amount": 1}),
        )
        .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(chain.balance(&to, "uosmo"), OSMO);
    assert_eq!(chain.broadcasts(), 1);
    assert!(flaky.hits() >= 1);
}

#[tokio::test]
async fn test_all_endpoints_down() {
    let endpoints = vec![
        dead_endpoint().await,
        dead_endpoint().await,
        dead_endpoint().await,
    ];
    let relay = Relay::start(relay_config(endpoints.clone())).await;

    let (status, body) = relay
        .post("/balance", json!({"address": sender_address()}))
        .await;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    // Three attempts rotate twice.
    let (_, health) = relay.get("/health").await;
    assert_eq!(health["rpc"], endpoints[2].as_str());
}

#[tokio::test]
async fn test_gateway_errors_exhaust_attempts() {
    let node = MockNode::start(funded_chain()).await;
    node.fail_with(Some(502));
    let relay = Relay::start(relay_config(vec![node.url.clone()])).await;

    let (status, body) = relay
        .post("/balance", json!({"address": sender_address()}))
        .await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("502"));
    assert_eq!(node.hits(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let node = MockNode::start(MockChain::new()).await;
    let relay = Relay::start(relay_config(vec![node.url.clone()])).await;

    let (status, _) = relay
        .post(
            "/send",
            json!({"sender_credential": TEST_MNEMONIC, "recipient_address": recipient(1), "amount": 1}),
        )
        .await;
    assert_eq!(status, 400);
    // One account lookup, no retries.
    assert_eq!(node.hits(), 1);
}

#[tokio::test]
async fn test_lost_broadcast_response_is_not_resubmitted() {
    let chain = funded_chain();
    let first = MockNode::start(chain.clone()).await;
    let second = MockNode::start(chain.clone()).await;
    first.swallow_next_broadcast();

    let relay = Relay::start(relay_config(vec![first.url.clone(), second.url.clone()])).await;
    let to = recipient(9);

    let (status, body) = relay
        .post(
            "/send",
            json!({"sender_credential": TEST_MNEMONIC, "recipient_address": to, "amount": 3}),
        )
        .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["fee_paid"], "3250uosmo");
    assert_eq!(chain.broadcasts(), 1);
    assert_eq!(chain.balance(&to, "uosmo"), 3 * OSMO);
    assert_eq!(chain.sequence(&sender_address()), Some(1));
}

#[tokio::test]
async fn test_unresponsive_nodes_fail_send_with_json_error() {
    let endpoints = vec![hung_endpoint().await, hung_endpoint().await, hung_endpoint().await];
    let mut config = relay_config(endpoints.clone());
    config.node.request_timeout_secs = 1;
    let relay = Relay::start(config).await;

    let (status, body) = relay
        .post(
            "/send",
            json!({"sender_credential": TEST_MNEMONIC, "recipient_address": recipient(1), "amount": 1}),
        )
        .await;

    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Request timed out after 1 seconds");

    let (_, health) = relay.get("/health").await;
    assert_eq!(health["rpc"], endpoints[2].as_str());
}

#[tokio::test]
async fn test_read_deadline_answers_with_json_error() {
    let mut config = relay_config(vec![hung_endpoint().await]);
    config.node.request_timeout_secs = 5;
    config.security.request_timeout_secs = 1;
    let relay = Relay::start(config).await;

    let (status, body) = relay
        .post("/balance", json!({"address": sender_address()}))
        .await;

    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Request timed out after 1s");
}
