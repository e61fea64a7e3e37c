//! Gas simulation and fee derivation.
//!
//! `gas_limit = ceil(gas_used * safety_factor)` and
//! `fee = ceil(gas_limit * gas_price)`, both in integer arithmetic so the
//! same simulation always produces the same fee.

use crate::blockchain::client::NodeClient;
use crate::blockchain::denom::parse_decimal;
use crate::blockchain::transaction::{TransferMessage, TxSigner};
use crate::blockchain::types::{AccountInfo, BlockchainError, BlockchainResult, CoinAmount, Fee};
use crate::blockchain::wallet::Wallet;
use crate::config::FeeConfig;
use crate::endpoints::Endpoint;

/// Fixed gas price, parsed exactly (`0.025` → 25 / 10^3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    numerator: u128,
    scale: u32,
    pub denom: String,
}

impl GasPrice {
    pub fn parse(amount: &str, denom: &str) -> BlockchainResult<Self> {
        let (numerator, scale) = parse_decimal(amount)
            .map_err(|_| BlockchainError::Config(format!("Invalid gas price '{}'", amount)))?;
        if numerator == 0 {
            return Err(BlockchainError::Config("Gas price must be positive".to_string()));
        }
        Ok(Self {
            numerator,
            scale,
            denom: denom.to_string(),
        })
    }

    /// `ceil(gas_limit * price)` in base units.
    pub fn fee_for(&self, gas_limit: u64) -> u128 {
        let divisor = 10u128.pow(self.scale);
        let product = gas_limit as u128 * self.numerator;
        product.div_ceil(divisor)
    }
}

/// Apply a safety factor to a gas estimate, rounding up.
///
/// The factor is taken to thousandths so `1.3` multiplies exactly.
pub fn apply_safety_factor(gas_estimate: u64, safety_factor: f64) -> u64 {
    let millis = (safety_factor * 1000.0).round().max(0.0) as u128;
    let scaled = (gas_estimate as u128 * millis).div_ceil(1000);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Estimates fees by simulating against a node.
#[derive(Debug, Clone)]
pub struct FeeEstimator {
    client: NodeClient,
    signer: TxSigner,
    gas_price: GasPrice,
}

impl FeeEstimator {
    pub fn new(client: NodeClient, signer: TxSigner, gas_price: GasPrice) -> Self {
        Self {
            client,
            signer,
            gas_price,
        }
    }

    pub fn from_config(client: NodeClient, signer: TxSigner, config: &FeeConfig) -> BlockchainResult<Self> {
        let gas_price = GasPrice::parse(&config.gas_price, &config.gas_denom)?;
        Ok(Self::new(client, signer, gas_price))
    }

    pub fn gas_price(&self) -> &GasPrice {
        &self.gas_price
    }

    /// Derive a fee from an already-known gas estimate.
    pub fn fee_from_estimate(&self, gas_estimate: u64, safety_factor: f64) -> Fee {
        let gas_limit = apply_safety_factor(gas_estimate, safety_factor);
        Fee {
            amount: CoinAmount {
                denom: self.gas_price.denom.clone(),
                amount: self.gas_price.fee_for(gas_limit),
            },
            gas_limit,
        }
    }

    /// Simulate `messages` on `endpoint` and derive the fee.
    ///
    /// The simulation transaction is signed with a zero fee; nodes ignore the
    /// fee and gas limit in simulate mode.
    pub async fn estimate(
        &self,
        wallet: &Wallet,
        account: AccountInfo,
        messages: &[TransferMessage],
        memo: &str,
        endpoint: &Endpoint,
        safety_factor: f64,
    ) -> BlockchainResult<Fee> {
        let draft_fee = Fee {
            amount: CoinAmount {
                denom: self.gas_price.denom.clone(),
                amount: 0,
            },
            gas_limit: 0,
        };
        let draft = self.signer.sign(wallet, account, messages, memo, &draft_fee)?;
        let gas_estimate = self.client.simulate(endpoint, &draft.bytes).await?;
        let fee = self.fee_from_estimate(gas_estimate, safety_factor);

        tracing::debug!(
            endpoint = %endpoint,
            gas_estimate = gas_estimate,
            gas_limit = fee.gas_limit,
            fee = %fee.amount,
            "Fee estimated"
        );
        Ok(fee)
    }
}
