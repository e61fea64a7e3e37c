//! Node REST client with per-call timeouts.
//!
//! # Responsibilities
//! - Query balances and account state
//! - Simulate transactions for gas estimation
//! - Broadcast signed transactions and look them up by hash
//! - Map every failure to a `BlockchainError` whose text the classifier understands
//!
//! Every call takes the endpoint explicitly; choosing and rotating endpoints
//! is the failover executor's job, not the client's.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::blockchain::types::{AccountInfo, BlockchainError, BlockchainResult, TransactionResult};
use crate::endpoints::Endpoint;

/// Thin client over a node's REST gateway.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    timeout_duration: Duration,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Option<RawCoin>,
}

#[derive(Debug, Deserialize)]
struct RawCoin {
    denom: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: RawAccount,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default)]
    sequence: Option<String>,
    /// Vesting and module accounts nest the base account.
    #[serde(default)]
    base_account: Option<Box<RawAccount>>,
    #[serde(default)]
    base_vesting_account: Option<Box<RawAccount>>,
}

#[derive(Debug, Serialize)]
struct TxBytesRequest<'a> {
    tx_bytes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SimulateResponse {
    gas_info: GasInfo,
}

#[derive(Debug, Deserialize)]
struct GasInfo {
    gas_used: String,
}

#[derive(Debug, Deserialize)]
struct TxEnvelope {
    tx_response: TxResponse,
}

/// Node-side view of a transaction (`tx_response` object).
#[derive(Debug, Clone, Deserialize)]
pub struct TxResponse {
    #[serde(default)]
    pub height: String,
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub gas_wanted: String,
    #[serde(default)]
    pub gas_used: String,
}

impl TxResponse {
    /// Convert into the domain result, tolerating empty numeric strings.
    pub fn into_result(self) -> TransactionResult {
        TransactionResult {
            code: self.code,
            hash: self.txhash,
            height: parse_u64_or_zero(&self.height),
            gas_used: parse_u64_or_zero(&self.gas_used),
            gas_wanted: parse_u64_or_zero(&self.gas_wanted),
            raw_log: self.raw_log,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NodeErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_u64_or_zero(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

fn parse_u64_field(raw: Option<&String>, field: &str) -> BlockchainResult<u64> {
    raw.ok_or_else(|| BlockchainError::Decode(format!("missing {}", field)))?
        .parse()
        .map_err(|e| BlockchainError::Decode(format!("bad {}: {}", field, e)))
}

impl RawAccount {
    fn into_info(self) -> BlockchainResult<AccountInfo> {
        if self.account_number.is_some() {
            return Ok(AccountInfo {
                account_number: parse_u64_field(self.account_number.as_ref(), "account_number")?,
                sequence: parse_u64_field(self.sequence.as_ref(), "sequence")?,
            });
        }
        if let Some(vesting) = self.base_vesting_account {
            return vesting.into_info();
        }
        match self.base_account {
            Some(base) => base.into_info(),
            None => Err(BlockchainError::Decode("account has no account_number".to_string())),
        }
    }
}

impl NodeClient {
    /// Create a client whose every call is bounded by `timeout_secs`.
    pub fn new(timeout_secs: u64) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(timeout_secs.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(|e| BlockchainError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            timeout_duration,
        })
    }

    /// Balance of `address` in `denom`, in base units.
    pub async fn get_balance(&self, endpoint: &Endpoint, address: &str, denom: &str) -> BlockchainResult<u128> {
        let url = endpoint.join(&format!("/cosmos/bank/v1beta1/balances/{}/by_denom", address));
        let request = self.http.get(url).query(&[("denom", denom)]);
        let body: BalanceResponse = self.send_json(request).await?;

        match body.balance {
            Some(coin) => {
                if coin.denom != denom && !coin.denom.is_empty() {
                    tracing::warn!(requested = denom, returned = %coin.denom, "Node returned a different denom");
                }
                coin.amount
                    .parse()
                    .map_err(|e| BlockchainError::Decode(format!("bad balance amount '{}': {}", coin.amount, e)))
            }
            None => Ok(0),
        }
    }

    /// Account number and sequence for signing.
    pub async fn get_account(&self, endpoint: &Endpoint, address: &str) -> BlockchainResult<AccountInfo> {
        let url = endpoint.join(&format!("/cosmos/auth/v1beta1/accounts/{}", address));
        match self.send_json::<AccountResponse>(self.http.get(url)).await {
            Ok(body) => body.account.into_info(),
            Err(BlockchainError::Http { status: 404, .. }) => {
                Err(BlockchainError::AccountNotFound(address.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Dry-run a signed transaction and return the gas it consumed.
    pub async fn simulate(&self, endpoint: &Endpoint, tx_bytes: &[u8]) -> BlockchainResult<u64> {
        let url = endpoint.join("/cosmos/tx/v1beta1/simulate");
        let payload = TxBytesRequest {
            tx_bytes: base64::engine::general_purpose::STANDARD.encode(tx_bytes),
            mode: None,
        };
        let body: SimulateResponse = self.send_json(self.http.post(url).json(&payload)).await?;
        body.gas_info
            .gas_used
            .parse()
            .map_err(|e| BlockchainError::Decode(format!("bad gas_used '{}': {}", body.gas_info.gas_used, e)))
    }

    /// Broadcast in sync mode: returns once the node has run check-tx.
    pub async fn broadcast(&self, endpoint: &Endpoint, tx_bytes: &[u8]) -> BlockchainResult<TxResponse> {
        let url = endpoint.join("/cosmos/tx/v1beta1/txs");
        let payload = TxBytesRequest {
            tx_bytes: base64::engine::general_purpose::STANDARD.encode(tx_bytes),
            mode: Some("BROADCAST_MODE_SYNC"),
        };
        let body: TxEnvelope = self.send_json(self.http.post(url).json(&payload)).await?;
        Ok(body.tx_response)
    }

    /// Look up an indexed transaction; `None` while it is not in a block.
    pub async fn get_tx(&self, endpoint: &Endpoint, hash: &str) -> BlockchainResult<Option<TxResponse>> {
        let url = endpoint.join(&format!("/cosmos/tx/v1beta1/txs/{}", hash));
        match self.send_json::<TxEnvelope>(self.http.get(url)).await {
            Ok(body) => Ok(Some(body.tx_response)),
            Err(BlockchainError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Lightweight reachability check.
    pub async fn is_healthy(&self, endpoint: &Endpoint) -> bool {
        let url = endpoint.join("/cosmos/base/tendermint/v1beta1/syncing");
        self.with_timeout(self.http.get(url).send())
            .await
            .map(|r| r.map(|resp| resp.status().is_success()).unwrap_or(false))
            .unwrap_or(false)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> BlockchainResult<T> {
        let response = self
            .with_timeout(request.send())
            .await?
            .map_err(|e| BlockchainError::from_reqwest(e, self.timeout_duration.as_secs()))?;

        let status = response.status();
        let text = self
            .with_timeout(response.text())
            .await?
            .map_err(|e| BlockchainError::from_reqwest(e, self.timeout_duration.as_secs()))?;

        if !status.is_success() {
            return Err(BlockchainError::Http {
                status: status.as_u16(),
                message: node_error_message(&text, status.canonical_reason()),
            });
        }

        serde_json::from_str(&text).map_err(|e| BlockchainError::Decode(format!("{}: {}", e, truncate(&text, 200))))
    }

    async fn with_timeout<F: Future>(&self, fut: F) -> BlockchainResult<F::Output> {
        timeout(self.timeout_duration, fut)
            .await
            .map_err(|_| BlockchainError::Timeout(self.timeout_duration.as_secs()))
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}

/// Prefer the node's own `message`, fall back to the raw body, then the reason phrase.
fn node_error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<NodeErrorBody>(body) {
        if let Some(msg) = parsed.message.or(parsed.error).filter(|m| !m.is_empty()) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason.unwrap_or("no response body").to_string()
    } else {
        truncate(trimmed, 500).to_string()
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
