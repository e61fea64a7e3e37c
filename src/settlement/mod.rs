//! Betting round settlement.
//!
//! # Data Flow
//! ```text
//! Participants + winning option
//!     → payouts.rs (pool, house fee, equal winner share)
//!     → TransferInstruction list
//!     → blockchain::service (one multisend)
//! ```
//!
//! # Design Decisions
//! - Plans are pure: computing a plan never touches the network
//! - Rounding always favours the house; no payout exceeds the pool

pub mod payouts;

pub use payouts::{plan_payouts, plan_refunds, Participant, PayoutPlan, RefundPlan};
