//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Request credential + transfer instructions
//!     → wallet.rs (key derivation, never cached)
//!     → denom.rs / aggregator.rs (token → denom, base units, multisend IO)
//!     → fees.rs (simulate, apply safety factor, derive fee)
//!     → transaction.rs (build and sign)
//!     → submitter.rs (broadcast, wait for inclusion)
//!     → client.rs (REST calls with timeouts, one endpoint per call)
//! service.rs drives the above through the failover executor.
//! ```
//!
//! # Security Constraints
//! - Credentials arrive per request and are dropped with it
//! - Never log keys or mnemonics, only derived addresses
//! - All node calls have configurable timeouts

pub mod aggregator;
pub mod client;
pub mod denom;
pub mod fees;
pub mod service;
pub mod submitter;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use aggregator::{aggregate, TransferInstruction};
pub use client::NodeClient;
pub use denom::DenomTable;
pub use fees::FeeEstimator;
pub use service::TransferService;
pub use submitter::TxSubmitter;
pub use types::{BlockchainError, BlockchainResult, CoinAmount, Fee, TransactionResult};
pub use wallet::Wallet;
