//! Winner payout and refund planning.
//!
//! All arithmetic is in base units. The house fee is
//! `floor(pool * fee / 100)` with the fee percentage taken to hundredths,
//! each winner gets `floor(payout_pool / winners)`, and whatever the equal
//! split cannot distribute stays with the house as dust.

use serde::{Deserialize, Serialize};

use crate::blockchain::aggregator::TransferInstruction;
use crate::blockchain::denom::{format_units, DenomTable};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// One bettor in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: String,
    /// Stake as a human decimal amount.
    pub amount: String,
    #[serde(default)]
    pub token: Option<String>,
    pub option: u32,
}

/// Outcome of [`plan_payouts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutPlan {
    pub token: String,
    pub denom: String,
    pub total_pool: u128,
    pub house_fee: u128,
    pub payout_pool: u128,
    pub payout_per_winner: u128,
    /// Remainder of the equal split, kept by the house.
    pub dust: u128,
    pub winners: usize,
    pub no_winners: bool,
    pub instructions: Vec<TransferInstruction>,
}

/// Outcome of [`plan_refunds`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundPlan {
    pub participants: usize,
    pub instructions: Vec<TransferInstruction>,
}

fn fee_hundredths(fee_percentage: f64) -> BlockchainResult<u128> {
    if !fee_percentage.is_finite() || !(0.0..=100.0).contains(&fee_percentage) {
        return Err(BlockchainError::InvalidAmount(format!(
            "fee percentage {} outside 0..=100",
            fee_percentage
        )));
    }
    Ok((fee_percentage * 100.0).round() as u128)
}

fn participant_token<'a>(participant: &'a Participant, denoms: &'a DenomTable) -> &'a str {
    participant.token.as_deref().unwrap_or_else(|| denoms.native_token())
}

/// Split the pool among participants who picked `winning_option`.
///
/// The pool must be single-token. With no winners the plan carries no
/// instructions and `no_winners` is set.
pub fn plan_payouts(
    participants: &[Participant],
    winning_option: u32,
    fee_percentage: f64,
    denoms: &DenomTable,
) -> BlockchainResult<PayoutPlan> {
    let first = participants
        .first()
        .ok_or_else(|| BlockchainError::InvalidAmount("no participants".to_string()))?;
    let fee_hundredths = fee_hundredths(fee_percentage)?;

    let token = participant_token(first, denoms).to_lowercase();
    let denom = denoms.resolve(&token);

    let mut total_pool: u128 = 0;
    for participant in participants {
        let this_denom = denoms.resolve(participant_token(participant, denoms));
        if this_denom != denom {
            return Err(BlockchainError::InvalidAmount(format!(
                "mixed-token pool: {} and {}",
                denom, this_denom
            )));
        }
        let stake = denoms.to_base_units(&participant.amount)?;
        total_pool = total_pool
            .checked_add(stake)
            .ok_or_else(|| BlockchainError::InvalidAmount("pool total overflows".to_string()))?;
    }

    let house_fee = total_pool * fee_hundredths / 10_000;
    let payout_pool = total_pool - house_fee;

    let winners: Vec<&Participant> = participants.iter().filter(|p| p.option == winning_option).collect();
    if winners.is_empty() {
        tracing::info!(total_pool, winning_option, "No winners in round");
        return Ok(PayoutPlan {
            token,
            denom,
            total_pool,
            house_fee,
            payout_pool,
            payout_per_winner: 0,
            dust: 0,
            winners: 0,
            no_winners: true,
            instructions: Vec::new(),
        });
    }

    let count = winners.len() as u128;
    let payout_per_winner = payout_pool / count;
    let dust = payout_pool - payout_per_winner * count;
    let amount = format_units(payout_per_winner, denoms.decimals());

    let instructions = winners
        .iter()
        .map(|w| TransferInstruction::new(w.address.clone(), amount.clone(), token.clone()))
        .collect();

    tracing::info!(
        total_pool,
        house_fee,
        payout_per_winner,
        dust,
        winners = winners.len(),
        "Payout plan computed"
    );

    Ok(PayoutPlan {
        token,
        denom,
        total_pool,
        house_fee,
        payout_pool,
        payout_per_winner,
        dust,
        winners: winners.len(),
        no_winners: false,
        instructions,
    })
}

/// Return every participant's own stake in their own token.
pub fn plan_refunds(participants: &[Participant], denoms: &DenomTable) -> BlockchainResult<RefundPlan> {
    if participants.is_empty() {
        return Err(BlockchainError::InvalidAmount("no participants to refund".to_string()));
    }

    let instructions = participants
        .iter()
        .map(|p| TransferInstruction::new(p.address.clone(), p.amount.clone(), participant_token(p, denoms)))
        .collect();

    Ok(RefundPlan {
        participants: participants.len(),
        instructions,
    })
}
