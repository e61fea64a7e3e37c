//! Chain-specific types and error definitions.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during blockchain operations.
///
/// Display strings are what the failover classifier inspects, so variants
/// carry the node's own message rather than a paraphrase.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Node answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Request never produced a response (connect, DNS, socket, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Node call exceeded its deadline.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Node answered 200 but the payload was not what we expected.
    #[error("Unexpected node response: {0}")]
    Decode(String),

    /// Broadcast accepted but not seen in a block within the deadline.
    #[error("Transaction {hash} timed out waiting for inclusion after {secs} seconds")]
    InclusionTimeout { hash: String, secs: u64 },

    /// Recipient or sender address failed bech32/prefix validation.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Amount text is not a non-negative decimal.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount truncates to zero base units.
    #[error("Amount too small: {0} converts to 0 base units")]
    AmountTooSmall(String),

    /// Credential could not be turned into a signing key.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Transaction construction or signing failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Account does not exist on chain.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Node returned a non-zero result code; `raw_log` is the node's reason.
    #[error("Transaction failed: {raw_log}")]
    Rejected { code: u32, hash: String, raw_log: String },

    /// Endpoint or chain configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BlockchainError {
    /// Map a reqwest failure, keeping the source chain in the message so
    /// "connection refused" and friends stay visible to the classifier.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            return BlockchainError::Timeout(timeout_secs);
        }

        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        BlockchainError::Transport(message)
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// A coin in base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinAmount {
    pub denom: String,
    pub amount: u128,
}

impl std::fmt::Display for CoinAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Fee attached to a transaction. Derived per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fee {
    pub amount: CoinAmount,
    pub gas_limit: u64,
}

/// Outcome reported by the node for a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResult {
    pub code: u32,
    pub hash: String,
    pub height: u64,
    pub gas_used: u64,
    pub gas_wanted: u64,
    pub raw_log: String,
}

impl TransactionResult {
    /// `code == 0` is the only success signal.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Turn a non-zero code into [`BlockchainError::Rejected`].
    pub fn into_outcome(self) -> BlockchainResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BlockchainError::Rejected {
                code: self.code,
                hash: self.hash,
                raw_log: self.raw_log,
            })
        }
    }
}

/// Account state needed for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "Request timed out after 10 seconds");

        let err = BlockchainError::Http {
            status: 429,
            message: "Too Many Requests".into(),
        };
        assert_eq!(err.to_string(), "HTTP 429: Too Many Requests");

        let err = BlockchainError::AmountTooSmall("0.0000001".into());
        assert!(err.to_string().to_lowercase().contains("amount too small"));

        let err = BlockchainError::Rejected {
            code: 5,
            hash: "AB".into(),
            raw_log: "insufficient funds".into(),
        };
        assert_eq!(err.to_string(), "Transaction failed: insufficient funds");
    }

    #[test]
    fn test_result_success_flag() {
        let mut result = TransactionResult {
            code: 0,
            hash: "ABC".into(),
            height: 10,
            gas_used: 80_000,
            gas_wanted: 104_000,
            raw_log: String::new(),
        };
        assert!(result.is_success());
        result.code = 5;
        assert!(!result.is_success());
    }

    #[test]
    fn test_coin_display() {
        let coin = CoinAmount {
            denom: "uosmo".into(),
            amount: 2_600,
        };
        assert_eq!(coin.to_string(), "2600uosmo");
    }
}
