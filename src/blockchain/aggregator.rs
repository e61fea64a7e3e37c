//! Payout aggregation into a single multisend.
//!
//! One output per instruction, in instruction order; one input for the
//! sender carrying the per-denom totals of those outputs. The input is summed
//! from the very coins placed in the outputs, so the ledger balances by
//! construction.

use cosmrs::AccountId;
use serde::{Deserialize, Serialize};

use crate::blockchain::denom::DenomTable;
use crate::blockchain::transaction::TransferIo;
use crate::blockchain::types::{BlockchainError, BlockchainResult, CoinAmount};
use crate::blockchain::wallet::parse_address;

/// A single payout request: who gets how much of which token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInstruction {
    pub recipient_address: String,
    /// Human-readable decimal amount (e.g. `"2.5"`).
    pub amount: String,
    pub token: String,
}

impl TransferInstruction {
    pub fn new(recipient_address: impl Into<String>, amount: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            amount: amount.into(),
            token: token.into(),
        }
    }
}

/// Result of aggregation: exactly one input and one output per instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregated {
    pub inputs: Vec<TransferIo>,
    pub outputs: Vec<TransferIo>,
}

impl Aggregated {
    /// Per-denom totals in first-seen order (the sender's input coins).
    pub fn totals(&self) -> &[CoinAmount] {
        self.inputs.first().map(|io| io.coins.as_slice()).unwrap_or(&[])
    }
}

/// Convert one instruction into a denom and base-unit amount.
pub fn resolve_coin(instruction: &TransferInstruction, denoms: &DenomTable) -> BlockchainResult<CoinAmount> {
    let amount = denoms.to_base_units(&instruction.amount)?;
    if amount == 0 {
        return Err(BlockchainError::AmountTooSmall(instruction.amount.clone()));
    }
    Ok(CoinAmount {
        denom: denoms.resolve(&instruction.token),
        amount,
    })
}

/// Build the multisend inputs and outputs for `sender`.
pub fn aggregate(
    sender: &AccountId,
    instructions: &[TransferInstruction],
    denoms: &DenomTable,
) -> BlockchainResult<Aggregated> {
    if instructions.is_empty() {
        return Err(BlockchainError::InvalidAmount("no payout instructions".to_string()));
    }

    let prefix = sender.prefix();
    let mut totals: Vec<CoinAmount> = Vec::new();
    let mut outputs = Vec::with_capacity(instructions.len());

    for instruction in instructions {
        let address = parse_address(&instruction.recipient_address, prefix)?;
        let coin = resolve_coin(instruction, denoms)?;

        match totals.iter_mut().find(|c| c.denom == coin.denom) {
            Some(total) => {
                total.amount = total
                    .amount
                    .checked_add(coin.amount)
                    .ok_or_else(|| BlockchainError::InvalidAmount(format!("total for {} overflows", coin.denom)))?;
            }
            None => totals.push(coin.clone()),
        }

        outputs.push(TransferIo {
            address,
            coins: vec![coin],
        });
    }

    Ok(Aggregated {
        inputs: vec![TransferIo {
            address: sender.clone(),
            coins: totals,
        }],
        outputs,
    })
}
