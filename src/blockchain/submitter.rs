//! Sign, broadcast, and wait for inclusion.
//!
//! Broadcasts use sync mode: the node answers after check-tx, and inclusion
//! is confirmed by polling the tx lookup endpoint until the hash is indexed
//! or the inclusion deadline passes.
//!
//! A rotation can happen after the node already accepted the transaction
//! (e.g. the broadcast response was lost to a timeout). Each request carries
//! a [`PendingTx`] holding the hash of its last broadcast; the next attempt
//! looks that hash up on the new endpoint first and resumes from it instead
//! of signing a second transfer.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::time::{sleep, Instant};

use crate::blockchain::client::NodeClient;
use crate::blockchain::transaction::{TransferMessage, TxSigner};
use crate::blockchain::types::{BlockchainError, BlockchainResult, Fee, TransactionResult};
use crate::blockchain::wallet::Wallet;
use crate::config::NodeConfig;
use crate::endpoints::Endpoint;
use crate::observability::metrics;

/// Hash of the transaction last broadcast for one request.
#[derive(Debug, Default)]
pub struct PendingTx {
    hash: ArcSwapOption<String>,
}

impl PendingTx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self) -> Option<Arc<String>> {
        self.hash.load_full()
    }

    fn set(&self, hash: &str) {
        self.hash.store(Some(Arc::new(hash.to_string())));
    }

    fn clear(&self) {
        self.hash.store(None);
    }
}

/// Submits signed transfers to a node.
#[derive(Debug, Clone)]
pub struct TxSubmitter {
    client: NodeClient,
    signer: TxSigner,
    poll_interval: Duration,
    inclusion_timeout: Duration,
}

impl TxSubmitter {
    pub fn new(client: NodeClient, signer: TxSigner, poll_interval: Duration, inclusion_timeout: Duration) -> Self {
        Self {
            client,
            signer,
            poll_interval,
            inclusion_timeout,
        }
    }

    pub fn from_config(client: NodeClient, signer: TxSigner, config: &NodeConfig) -> Self {
        Self::new(
            client,
            signer,
            Duration::from_millis(config.poll_interval_ms.max(1)),
            Duration::from_secs(config.inclusion_timeout_secs),
        )
    }

    /// Resume a transaction broadcast by an earlier attempt.
    ///
    /// Returns `Some` when the pending hash is already indexed on `endpoint`.
    /// `None` means there is nothing to resume and the caller should sign
    /// afresh; the stale hash is kept until a new broadcast replaces it.
    pub async fn recover(
        &self,
        endpoint: &Endpoint,
        pending: &PendingTx,
    ) -> BlockchainResult<Option<TransactionResult>> {
        let Some(hash) = pending.hash() else {
            return Ok(None);
        };

        match self.client.get_tx(endpoint, &hash).await? {
            Some(found) => {
                tracing::info!(
                    endpoint = %endpoint,
                    tx_hash = %hash,
                    "Previous broadcast already included, skipping re-submission"
                );
                metrics::record_broadcast("resumed");
                Ok(Some(found.into_result()))
            }
            None => {
                tracing::warn!(
                    endpoint = %endpoint,
                    tx_hash = %hash,
                    "Previous broadcast not found on endpoint, signing again"
                );
                Ok(None)
            }
        }
    }

    /// Sign `messages` with a fresh account sequence, broadcast and wait.
    ///
    /// A non-zero code, at check-tx or after inclusion, is an `Ok` result.
    pub async fn submit(
        &self,
        wallet: &Wallet,
        messages: &[TransferMessage],
        fee: &Fee,
        memo: &str,
        endpoint: &Endpoint,
        pending: &PendingTx,
    ) -> BlockchainResult<TransactionResult> {
        let sender = wallet.address().to_string();
        let account = self.client.get_account(endpoint, &sender).await?;
        let signed = self.signer.sign(wallet, account, messages, memo, fee)?;

        pending.set(&signed.hash);
        tracing::info!(
            endpoint = %endpoint,
            tx_hash = %signed.hash,
            sequence = account.sequence,
            fee = %fee.amount,
            gas_limit = fee.gas_limit,
            "Broadcasting transaction"
        );

        let checked = self.client.broadcast(endpoint, &signed.bytes).await?;
        if checked.code != 0 {
            pending.clear();
            metrics::record_broadcast("rejected");
            tracing::warn!(
                tx_hash = %checked.txhash,
                code = checked.code,
                raw_log = %checked.raw_log,
                "Transaction rejected at check-tx"
            );
            return Ok(checked.into_result());
        }

        let result = self.wait_for_inclusion(endpoint, &signed.hash).await?;
        metrics::record_broadcast(if result.is_success() { "included" } else { "failed" });
        Ok(result)
    }

    /// Poll until `hash` is indexed or the inclusion deadline passes.
    pub async fn wait_for_inclusion(&self, endpoint: &Endpoint, hash: &str) -> BlockchainResult<TransactionResult> {
        let deadline = Instant::now() + self.inclusion_timeout;

        loop {
            if let Some(found) = self.client.get_tx(endpoint, hash).await? {
                let result = found.into_result();
                tracing::info!(
                    tx_hash = %result.hash,
                    height = result.height,
                    code = result.code,
                    gas_used = result.gas_used,
                    "Transaction included"
                );
                return Ok(result);
            }

            if Instant::now() + self.poll_interval > deadline {
                return Err(BlockchainError::InclusionTimeout {
                    hash: hash.to_string(),
                    secs: self.inclusion_timeout.as_secs(),
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}
