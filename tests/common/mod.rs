//! Shared utilities for integration testing.
//!
//! A [`MockChain`] holds bank state and indexed transactions. Any number of
//! [`MockNode`]s serve the same chain over the REST gateway routes the relay
//! uses, each with its own injectable faults, so failover between nodes sees
//! one consistent ledger.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use cosmrs::bank::{MsgMultiSend, MsgSend};
use cosmrs::tx::Msg;
use cosmrs::Tx;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;

use payout_relay::config::AppConfig;
use payout_relay::lifecycle::startup;
use payout_relay::HttpServer;

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub const TEST_MNEMONIC_24: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
     abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Gas every simulation reports.
pub const SIMULATED_GAS: u64 = 100_000;

#[derive(Default)]
struct ChainState {
    balances: HashMap<(String, String), u128>,
    accounts: HashMap<String, (u64, u64)>,
    txs: HashMap<String, Value>,
    height: u64,
    broadcasts: usize,
    last_outputs: Vec<(String, String, u128)>,
}

/// In-memory bank ledger shared by mock nodes.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
}

/// One transfer leg decoded from a transaction.
struct Leg {
    from: String,
    to: String,
    denom: String,
    amount: u128,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Credit `amount` of `denom` and make sure the account exists.
    pub fn fund(&self, address: &str, denom: &str, amount: u128) {
        let mut state = self.state.lock().unwrap();
        let next_number = state.accounts.len() as u64 + 1;
        state.accounts.entry(address.to_string()).or_insert((next_number, 0));
        *state
            .balances
            .entry((address.to_string(), denom.to_string()))
            .or_default() += amount;
    }

    pub fn balance(&self, address: &str, denom: &str) -> u128 {
        let state = self.state.lock().unwrap();
        state
            .balances
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn sequence(&self, address: &str) -> Option<u64> {
        self.state.lock().unwrap().accounts.get(address).map(|(_, seq)| *seq)
    }

    /// Broadcasts accepted into a block.
    pub fn broadcasts(&self) -> usize {
        self.state.lock().unwrap().broadcasts
    }

    /// `(address, denom, amount)` outputs of the last included transaction.
    pub fn last_outputs(&self) -> Vec<(String, String, u128)> {
        self.state.lock().unwrap().last_outputs.clone()
    }

    fn account(&self, address: &str) -> Option<(u64, u64)> {
        self.state.lock().unwrap().accounts.get(address).copied()
    }

    fn lookup(&self, hash: &str) -> Option<Value> {
        self.state.lock().unwrap().txs.get(hash).cloned()
    }

    fn decode_legs(tx: &Tx) -> Result<Vec<Leg>, String> {
        let mut legs = Vec::new();
        for any in &tx.body.messages {
            match any.type_url.as_str() {
                "/cosmos.bank.v1beta1.MsgSend" => {
                    let msg = MsgSend::from_any(any).map_err(|e| e.to_string())?;
                    for coin in msg.amount {
                        legs.push(Leg {
                            from: msg.from_address.to_string(),
                            to: msg.to_address.to_string(),
                            denom: coin.denom.to_string(),
                            amount: coin.amount,
                        });
                    }
                }
                "/cosmos.bank.v1beta1.MsgMultiSend" => {
                    let msg = MsgMultiSend::from_any(any).map_err(|e| e.to_string())?;
                    let sender = msg
                        .inputs
                        .first()
                        .map(|i| i.address.to_string())
                        .ok_or("multisend without input")?;

                    let mut inputs: HashMap<String, u128> = HashMap::new();
                    for input in &msg.inputs {
                        for coin in &input.coins {
                            *inputs.entry(coin.denom.to_string()).or_default() += coin.amount;
                        }
                    }
                    let mut outputs: HashMap<String, u128> = HashMap::new();
                    for output in &msg.outputs {
                        for coin in &output.coins {
                            *outputs.entry(coin.denom.to_string()).or_default() += coin.amount;
                            legs.push(Leg {
                                from: sender.clone(),
                                to: output.address.to_string(),
                                denom: coin.denom.to_string(),
                                amount: coin.amount,
                            });
                        }
                    }
                    if inputs != outputs {
                        return Err("sum of inputs and outputs does not match: invalid coins".to_string());
                    }
                }
                other => return Err(format!("unsupported message {}", other)),
            }
        }
        Ok(legs)
    }

    /// Run check-tx and deliver-tx in one step, returning the `tx_response`.
    fn apply(&self, bytes: &[u8]) -> Value {
        let hash = hex::encode_upper(Sha256::digest(bytes));
        let reject = |code: u32, log: String| {
            json!({"height": "0", "txhash": hash, "code": code, "raw_log": log, "gas_wanted": "0", "gas_used": "0"})
        };

        let tx = match Tx::from_bytes(bytes) {
            Ok(tx) => tx,
            Err(e) => return reject(2, format!("tx parse error: {}", e)),
        };
        let legs = match Self::decode_legs(&tx) {
            Ok(legs) => legs,
            Err(e) => return reject(10, e),
        };
        let Some(sender) = legs.first().map(|l| l.from.clone()) else {
            return reject(10, "empty transaction".to_string());
        };
        let gas_limit = tx.auth_info.fee.gas_limit;
        let signed_sequence = tx.auth_info.signer_infos.first().map(|s| s.sequence).unwrap_or(0);

        let mut state = self.state.lock().unwrap();
        let Some((_, sequence)) = state.accounts.get(&sender).copied() else {
            return reject(9, format!("account {} not found", sender));
        };
        if signed_sequence != sequence {
            return reject(
                32,
                format!(
                    "account sequence mismatch, expected {}, got {}: incorrect account sequence",
                    sequence, signed_sequence
                ),
            );
        }

        let mut required: HashMap<String, u128> = HashMap::new();
        for coin in &tx.auth_info.fee.amount {
            *required.entry(coin.denom.to_string()).or_default() += coin.amount;
        }
        for leg in &legs {
            *required.entry(leg.denom.clone()).or_default() += leg.amount;
        }
        for (denom, needed) in &required {
            let have = state
                .balances
                .get(&(sender.clone(), denom.clone()))
                .copied()
                .unwrap_or(0);
            if have < *needed {
                return reject(
                    5,
                    format!(
                        "spendable balance {}{} is smaller than {}{}: insufficient funds",
                        have, denom, needed, denom
                    ),
                );
            }
        }

        for (denom, needed) in required {
            *state.balances.entry((sender.clone(), denom)).or_default() -= needed;
        }
        state.last_outputs.clear();
        for leg in legs {
            *state.balances.entry((leg.to.clone(), leg.denom.clone())).or_default() += leg.amount;
            state.last_outputs.push((leg.to, leg.denom, leg.amount));
        }
        if let Some(account) = state.accounts.get_mut(&sender) {
            account.1 += 1;
        }
        state.height += 1;
        state.broadcasts += 1;

        let response = json!({
            "height": state.height.to_string(),
            "txhash": hash,
            "code": 0,
            "raw_log": "",
            "gas_wanted": gas_limit.to_string(),
            "gas_used": SIMULATED_GAS.to_string(),
        });
        state.txs.insert(hash, response.clone());
        response
    }
}

/// Faults injected into one node.
#[derive(Default)]
pub struct Faults {
    /// Answer every request with this status.
    status: Mutex<Option<u16>>,
    /// Accept the next broadcast into the chain but answer 504.
    swallow_next_broadcast: AtomicBool,
    hits: AtomicUsize,
}

#[derive(Clone)]
struct NodeState {
    chain: Arc<MockChain>,
    faults: Arc<Faults>,
}

/// A mock REST gateway serving a [`MockChain`].
pub struct MockNode {
    pub addr: SocketAddr,
    pub url: String,
    pub chain: Arc<MockChain>,
    faults: Arc<Faults>,
}

impl MockNode {
    pub async fn start(chain: Arc<MockChain>) -> Self {
        let faults = Arc::new(Faults::default());
        let state = NodeState {
            chain: chain.clone(),
            faults: faults.clone(),
        };

        let app = Router::new()
            .route("/cosmos/bank/v1beta1/balances/{address}/by_denom", get(balance))
            .route("/cosmos/auth/v1beta1/accounts/{address}", get(account))
            .route("/cosmos/tx/v1beta1/simulate", post(simulate))
            .route("/cosmos/tx/v1beta1/txs", post(broadcast))
            .route("/cosmos/tx/v1beta1/txs/{hash}", get(lookup))
            .route("/cosmos/base/tendermint/v1beta1/syncing", get(syncing))
            .layer(middleware::from_fn_with_state(state.clone(), inject_faults))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            url: format!("http://{}", addr),
            chain,
            faults,
        }
    }

    /// Make every request fail with `status` (or clear the fault).
    pub fn fail_with(&self, status: Option<u16>) {
        *self.faults.status.lock().unwrap() = status;
    }

    pub fn swallow_next_broadcast(&self) {
        self.faults.swallow_next_broadcast.store(true, Ordering::SeqCst);
    }

    /// Requests this node has received.
    pub fn hits(&self) -> usize {
        self.faults.hits.load(Ordering::SeqCst)
    }
}

async fn inject_faults(State(state): State<NodeState>, request: Request, next: Next) -> Response {
    state.faults.hits.fetch_add(1, Ordering::SeqCst);
    let status = *state.faults.status.lock().unwrap();
    match status {
        Some(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let reason = status.canonical_reason().unwrap_or("error");
            (status, Json(json!({"code": 14, "message": reason}))).into_response()
        }
        None => next.run(request).await,
    }
}

#[derive(Deserialize)]
struct DenomQuery {
    denom: String,
}

async fn balance(
    State(state): State<NodeState>,
    Path(address): Path<String>,
    Query(query): Query<DenomQuery>,
) -> Json<Value> {
    let amount = state.chain.balance(&address, &query.denom);
    Json(json!({"balance": {"denom": query.denom, "amount": amount.to_string()}}))
}

async fn account(State(state): State<NodeState>, Path(address): Path<String>) -> Response {
    match state.chain.account(&address) {
        Some((number, sequence)) => Json(json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": address,
                "pub_key": null,
                "account_number": number.to_string(),
                "sequence": sequence.to_string(),
            }
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 5, "message": format!("rpc error: code = NotFound desc = account {} not found", address)})),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct TxBytesBody {
    tx_bytes: String,
}

fn decode_body(body: &TxBytesBody) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD.decode(&body.tx_bytes).ok()
}

async fn simulate(Json(body): Json<TxBytesBody>) -> Response {
    match decode_body(&body).and_then(|b| Tx::from_bytes(&b).ok()) {
        Some(_) => Json(json!({
            "gas_info": {"gas_wanted": "0", "gas_used": SIMULATED_GAS.to_string()},
            "result": {"log": ""}
        }))
        .into_response(),
        None => (StatusCode::BAD_REQUEST, Json(json!({"code": 2, "message": "tx parse error"}))).into_response(),
    }
}

async fn broadcast(State(state): State<NodeState>, Json(body): Json<TxBytesBody>) -> Response {
    let Some(bytes) = decode_body(&body) else {
        return (StatusCode::BAD_REQUEST, Json(json!({"code": 2, "message": "invalid base64"}))).into_response();
    };
    let response = state.chain.apply(&bytes);

    if state.faults.swallow_next_broadcast.swap(false, Ordering::SeqCst) {
        return (StatusCode::GATEWAY_TIMEOUT, "upstream request timeout").into_response();
    }
    Json(json!({"tx_response": response})).into_response()
}

async fn lookup(State(state): State<NodeState>, Path(hash): Path<String>) -> Response {
    match state.chain.lookup(&hash) {
        Some(tx) => Json(json!({"tx_response": tx})).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": 5, "message": format!("tx not found: {}", hash)})),
        )
            .into_response(),
    }
}

async fn syncing() -> Json<Value> {
    Json(json!({"syncing": false}))
}

/// URL of a port nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// URL of a port that accepts connections and never answers.
pub async fn hung_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

/// Relay configuration pointing at `endpoints`, tuned for fast tests.
pub fn relay_config(endpoints: Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.node.endpoints = endpoints;
    config.node.request_timeout_secs = 2;
    config.node.poll_interval_ms = 10;
    config.node.inclusion_timeout_secs = 2;
    config.observability.metrics_enabled = false;
    config.security.request_timeout_secs = 30;
    config
}

/// A running relay façade.
pub struct Relay {
    pub url: String,
    pub client: reqwest::Client,
}

impl Relay {
    pub async fn start(config: AppConfig) -> Self {
        let service = startup::build_service(&config).unwrap();
        let server = HttpServer::new(service, &config.security);
        let router = server.router();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let res = self.client.get(format!("{}{}", self.url, path)).send().await.unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }
}

/// Bech32 address controlled by `credential`.
pub fn address_of(credential: &str) -> String {
    payout_relay::blockchain::Wallet::from_credential(credential, "osmo")
        .unwrap()
        .address()
        .to_string()
}

/// Bech32 address derived from [`TEST_MNEMONIC`].
pub fn sender_address() -> String {
    address_of(TEST_MNEMONIC)
}

/// A deterministic recipient address.
pub fn recipient(byte: u8) -> String {
    cosmrs::AccountId::new("osmo", &[byte; 20]).unwrap().to_string()
}
