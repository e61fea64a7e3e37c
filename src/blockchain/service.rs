//! Transfer orchestration.
//!
//! Every domain operation is handed to the failover executor as a closure
//! over the current endpoint. One attempt of a funds-moving operation runs:
//!
//! ```text
//! recover pending hash? ──yes──▶ done
//!        │ no
//!        ▼
//! fetch account → simulate (fee) → sign → broadcast → wait for inclusion
//! ```
//!
//! A non-zero result code comes back from the executor as a successful
//! attempt and only becomes an error afterwards, so it is never retried.

use std::sync::Arc;

use serde::Serialize;

use crate::blockchain::aggregator::{aggregate, resolve_coin, TransferInstruction};
use crate::blockchain::client::NodeClient;
use crate::blockchain::denom::DenomTable;
use crate::blockchain::fees::FeeEstimator;
use crate::blockchain::submitter::{PendingTx, TxSubmitter};
use crate::blockchain::transaction::{TransferMessage, TxSigner};
use crate::blockchain::types::{BlockchainError, BlockchainResult, CoinAmount, TransactionResult};
use crate::blockchain::wallet::{parse_address, Wallet};
use crate::config::AppConfig;
use crate::endpoints::EndpointPool;
use crate::resilience::FailoverExecutor;
use crate::settlement::{plan_payouts, plan_refunds, Participant, PayoutPlan};

/// Amount with its human rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountReport {
    pub denom: String,
    /// Base units, as a string so large values survive JSON.
    pub amount: String,
    pub formatted: String,
}

/// Receipt for an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub height: u64,
    pub gas_used: u64,
    pub gas_wanted: u64,
    /// Fee charged, e.g. `3250uosmo`.
    pub fee_paid: String,
}

/// Receipt for a multisend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultisendReceipt {
    #[serde(flatten)]
    pub receipt: TransferReceipt,
    pub recipients_count: usize,
    pub total_amounts: Vec<AmountReport>,
}

/// Outcome of settling a round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementReport {
    pub plan: PayoutPlan,
    pub successful_payouts: usize,
    /// Absent when nobody won.
    pub transaction: Option<MultisendReceipt>,
}

/// Outcome of refunding a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundReport {
    pub participants: usize,
    pub transaction: MultisendReceipt,
}

/// Node-facing snapshot for `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub rpc: String,
    pub rpc_reachable: bool,
    pub fallback_rpcs_available: usize,
    /// Attempts one request may make across the pool.
    pub max_attempts: u32,
    pub chain_id: String,
}

/// Balance, send, multisend and settlement over a rotating endpoint pool.
#[derive(Debug)]
pub struct TransferService {
    executor: FailoverExecutor,
    client: NodeClient,
    denoms: DenomTable,
    estimator: FeeEstimator,
    submitter: TxSubmitter,
    address_prefix: String,
    chain_id: String,
    send_gas_multiplier: f64,
    multisend_gas_multiplier: f64,
    fee_percentage: f64,
}

impl TransferService {
    /// Wire the engine from configuration around an injected pool.
    pub fn from_config(config: &AppConfig, pool: Arc<EndpointPool>) -> BlockchainResult<Self> {
        let client = NodeClient::new(config.node.request_timeout_secs)?;
        let signer = TxSigner::new(&config.node.chain_id)?;
        let estimator = FeeEstimator::from_config(client.clone(), signer.clone(), &config.fees)?;
        let submitter = TxSubmitter::from_config(client.clone(), signer, &config.node);

        Ok(Self {
            executor: FailoverExecutor::from_config(pool, &config.retries),
            client,
            denoms: DenomTable::from_config(&config.tokens),
            estimator,
            submitter,
            address_prefix: config.node.address_prefix.clone(),
            chain_id: config.node.chain_id.clone(),
            send_gas_multiplier: config.fees.send_gas_multiplier,
            multisend_gas_multiplier: config.fees.multisend_gas_multiplier,
            fee_percentage: config.settlement.fee_percentage,
        })
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        self.executor.pool()
    }

    pub fn denoms(&self) -> &DenomTable {
        &self.denoms
    }

    pub fn report(&self, coin: &CoinAmount) -> AmountReport {
        AmountReport {
            denom: coin.denom.clone(),
            amount: coin.amount.to_string(),
            formatted: self.denoms.format(coin.amount, &coin.denom),
        }
    }

    /// Current endpoint and whether it answers.
    pub async fn health(&self) -> HealthReport {
        let pool = self.pool();
        let current = pool.current();
        let fallbacks = pool.endpoints().iter().filter(|e| **e != current).count();
        HealthReport {
            rpc: current.to_string(),
            rpc_reachable: self.client.is_healthy(&current).await,
            fallback_rpcs_available: fallbacks,
            max_attempts: self.executor.max_attempts(),
            chain_id: self.chain_id.clone(),
        }
    }

    /// Balance of `address` in `denom` (native denom when absent).
    pub async fn balance(&self, address: &str, denom: Option<&str>) -> BlockchainResult<AmountReport> {
        let account = parse_address(address, &self.address_prefix)?.to_string();
        let denom = denom
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.denoms.native_denom())
            .to_string();

        let amount = self
            .executor
            .run("balance", |endpoint| {
                let client = &self.client;
                let account = account.as_str();
                let denom = denom.as_str();
                async move { client.get_balance(&endpoint, account, denom).await }
            })
            .await?;

        Ok(self.report(&CoinAmount { denom, amount }))
    }

    /// Send one coin to one recipient.
    pub async fn send(
        &self,
        credential: &str,
        recipient: &str,
        amount: &str,
        token: Option<&str>,
        memo: &str,
    ) -> BlockchainResult<TransferReceipt> {
        let wallet = Wallet::from_credential(credential, &self.address_prefix)?;
        let to = parse_address(recipient, &self.address_prefix)?;
        let token = token.unwrap_or_else(|| self.denoms.native_token());
        let coin = resolve_coin(&TransferInstruction::new(recipient, amount, token), &self.denoms)?;

        tracing::info!(
            from = %wallet.address(),
            to = %to,
            amount = %coin,
            "Preparing send"
        );

        let messages = [TransferMessage::Send {
            from: wallet.address().clone(),
            to,
            amount: vec![coin],
        }];
        let result = self
            .broadcast("send", &wallet, &messages, memo, self.send_gas_multiplier)
            .await?;
        Ok(self.receipt(result))
    }

    /// Pay every instruction from one sender in a single multisend.
    pub async fn multisend(
        &self,
        credential: &str,
        instructions: &[TransferInstruction],
        memo: &str,
    ) -> BlockchainResult<MultisendReceipt> {
        let wallet = Wallet::from_credential(credential, &self.address_prefix)?;
        let aggregated = aggregate(wallet.address(), instructions, &self.denoms)?;
        let total_amounts = aggregated.totals().iter().map(|c| self.report(c)).collect();
        let recipients_count = aggregated.outputs.len();

        tracing::info!(
            from = %wallet.address(),
            recipients = recipients_count,
            "Preparing multisend"
        );

        let messages = [TransferMessage::MultiSend {
            inputs: aggregated.inputs,
            outputs: aggregated.outputs,
        }];
        let result = self
            .broadcast("multisend", &wallet, &messages, memo, self.multisend_gas_multiplier)
            .await?;

        Ok(MultisendReceipt {
            receipt: self.receipt(result),
            recipients_count,
            total_amounts,
        })
    }

    /// Pay the winners of a round, keeping the house fee.
    pub async fn settle(
        &self,
        credential: &str,
        participants: &[Participant],
        winning_option: u32,
        memo: Option<&str>,
    ) -> BlockchainResult<SettlementReport> {
        let plan = plan_payouts(participants, winning_option, self.fee_percentage, &self.denoms)?;
        if plan.no_winners {
            return Ok(SettlementReport {
                plan,
                successful_payouts: 0,
                transaction: None,
            });
        }

        let memo = memo
            .map(str::to_string)
            .unwrap_or_else(|| format!("Betting Payouts - {} winners", plan.winners));
        let transaction = self.multisend(credential, &plan.instructions, &memo).await?;
        Ok(SettlementReport {
            successful_payouts: transaction.recipients_count,
            plan,
            transaction: Some(transaction),
        })
    }

    /// Return every participant's stake.
    pub async fn refund(
        &self,
        credential: &str,
        participants: &[Participant],
        memo: Option<&str>,
    ) -> BlockchainResult<RefundReport> {
        let plan = plan_refunds(participants, &self.denoms)?;
        let memo = memo
            .map(str::to_string)
            .unwrap_or_else(|| format!("Bet Cancellation Refunds - {} participants", plan.participants));
        let transaction = self.multisend(credential, &plan.instructions, &memo).await?;
        Ok(RefundReport {
            participants: plan.participants,
            transaction,
        })
    }

    /// Run one funds-moving operation through the executor.
    async fn broadcast(
        &self,
        operation: &str,
        wallet: &Wallet,
        messages: &[TransferMessage],
        memo: &str,
        safety_factor: f64,
    ) -> BlockchainResult<TransactionResult> {
        let pending = PendingTx::new();
        let sender = wallet.address().to_string();

        let result = self
            .executor
            .run(operation, |endpoint| {
                let pending = &pending;
                let sender = sender.as_str();
                async move {
                    if let Some(done) = self.submitter.recover(&endpoint, pending).await? {
                        return Ok(done);
                    }
                    let account = self.client.get_account(&endpoint, sender).await?;
                    let fee = self
                        .estimator
                        .estimate(wallet, account, messages, memo, &endpoint, safety_factor)
                        .await?;
                    self.submitter
                        .submit(wallet, messages, &fee, memo, &endpoint, pending)
                        .await
                }
            })
            .await?;

        if !result.is_success() {
            tracing::warn!(
                operation = operation,
                tx_hash = %result.hash,
                code = result.code,
                raw_log = %result.raw_log,
                "Transaction rejected by chain"
            );
        }
        result.into_outcome()
    }

    /// Fee paid equals `ceil(gas_wanted * gas_price)`: gas_wanted is the
    /// gas limit the fee was derived from.
    fn receipt(&self, result: TransactionResult) -> TransferReceipt {
        let price = self.estimator.gas_price();
        let fee = CoinAmount {
            denom: price.denom.clone(),
            amount: price.fee_for(result.gas_wanted),
        };
        TransferReceipt {
            tx_hash: result.hash,
            height: result.height,
            gas_used: result.gas_used,
            gas_wanted: result.gas_wanted,
            fee_paid: fee.to_string(),
        }
    }
}

/// Validation errors a caller can fix by changing the request.
pub fn is_client_error(err: &BlockchainError) -> bool {
    matches!(
        err,
        BlockchainError::InvalidAddress(_)
            | BlockchainError::InvalidAmount(_)
            | BlockchainError::AmountTooSmall(_)
            | BlockchainError::Wallet(_)
            | BlockchainError::AccountNotFound(_)
            | BlockchainError::Rejected { .. }
    )
}
