//! Error classification by message text.
//!
//! Errors reach us as node responses, transport failures and signing errors
//! with no shared structure, so classification works on the lower-cased
//! message. Rules are checked top-down and the first match wins.

use std::fmt;

/// Retry verdict for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The endpoint is unhealthy or stale; another endpoint may succeed.
    RetryableNetwork,
    /// The request itself is invalid; no endpoint can fix it.
    NonRetryableTransaction,
    /// Unrecognized; treated as non-retryable.
    Unknown,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::RetryableNetwork)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorClass::RetryableNetwork => "retryable_network",
            ErrorClass::NonRetryableTransaction => "non_retryable_transaction",
            ErrorClass::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A classification rule: predicate over the lower-cased message.
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub class: ErrorClass,
}

const TRANSACTION_PATTERNS: &[&str] = &[
    "insufficient funds",
    "insufficient balance",
    "amount too small",
    "amount is too small",
    "invalid address",
];

const NETWORK_PATTERNS: &[&str] = &[
    // transport
    "timeout",
    "timed out",
    "connection refused",
    "connection reset",
    "connection closed",
    "dns error",
    "failed to lookup address",
    "enotfound",
    "econnrefused",
    "econnreset",
    "etimedout",
    "socket",
    "error sending request",
    // gateway / rate limiting; status codes only as rendered by `BlockchainError::Http`
    "http 429",
    "too many requests",
    "http 502",
    "bad gateway",
    "http 503",
    "service unavailable",
    "http 504",
    "gateway timeout",
    // mempool capacity
    "mempool is full",
    "pool reached max tx capacity",
    // stale account view on the selected node
    "account sequence mismatch",
];

fn is_transaction_error(msg: &str) -> bool {
    TRANSACTION_PATTERNS.iter().any(|p| msg.contains(p))
}

fn is_network_error(msg: &str) -> bool {
    NETWORK_PATTERNS.iter().any(|p| msg.contains(p))
}

/// Prioritized classification table.
pub const CLASSIFICATION_RULES: &[Rule] = &[
    Rule {
        name: "transaction",
        matches: is_transaction_error,
        class: ErrorClass::NonRetryableTransaction,
    },
    Rule {
        name: "network",
        matches: is_network_error,
        class: ErrorClass::RetryableNetwork,
    },
];

/// Classify an error by its message.
pub fn classify<E: fmt::Display + ?Sized>(error: &E) -> ErrorClass {
    classify_message(&error.to_string())
}

/// Classify a raw error message.
pub fn classify_message(message: &str) -> ErrorClass {
    let lowered = message.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| (rule.matches)(&lowered))
        .map(|rule| rule.class)
        .unwrap_or(ErrorClass::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::BlockchainError;

    #[test]
    fn test_transaction_patterns_take_precedence() {
        assert_eq!(
            classify_message("insufficient funds: timeout"),
            ErrorClass::NonRetryableTransaction
        );
        assert_eq!(
            classify_message("HTTP 503: invalid address osmo1xyz"),
            ErrorClass::NonRetryableTransaction
        );
    }

    #[test]
    fn test_network_patterns() {
        for msg in [
            "request timed out",
            "Connection refused (os error 111)",
            "dns error: failed to lookup address information",
            "HTTP 429 Too Many Requests",
            "HTTP 502: upstream",
            "HTTP 504: Gateway Timeout",
            "mempool is full",
            "pool reached max tx capacity",
            "account sequence mismatch, expected 12, got 11: incorrect account sequence",
        ] {
            assert_eq!(classify_message(msg), ErrorClass::RetryableNetwork, "{}", msg);
        }
    }

    #[test]
    fn test_status_codes_need_http_prefix() {
        assert_eq!(
            classify_message("signature verification failed; verify correct account number (2504713)"),
            ErrorClass::Unknown
        );
        assert_eq!(classify_message("sent 4290000uosmo"), ErrorClass::Unknown);

        // Phrases still match anywhere, including inside a rejected memo.
        assert_eq!(
            classify_message("memo mentions service unavailable"),
            ErrorClass::RetryableNetwork
        );
        assert_eq!(
            classify_message("tx rejected: memo \"retry on HTTP 503\""),
            ErrorClass::RetryableNetwork
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify_message("INSUFFICIENT FUNDS"), ErrorClass::NonRetryableTransaction);
        assert_eq!(classify_message("ECONNREFUSED"), ErrorClass::RetryableNetwork);
    }

    #[test]
    fn test_unknown_is_not_retryable() {
        let class = classify_message("signature verification failed");
        assert_eq!(class, ErrorClass::Unknown);
        assert!(!class.is_retryable());
    }

    #[test]
    fn test_classify_typed_errors() {
        let err = BlockchainError::Http {
            status: 503,
            message: "service unavailable".into(),
        };
        assert_eq!(classify(&err), ErrorClass::RetryableNetwork);

        let err = BlockchainError::AmountTooSmall("0.0000001".into());
        assert_eq!(classify(&err), ErrorClass::NonRetryableTransaction);

        let err = BlockchainError::InvalidAddress("cosmos1abc".into());
        assert_eq!(classify(&err), ErrorClass::NonRetryableTransaction);
    }

    #[test]
    fn test_rule_order_is_explicit() {
        let names: Vec<_> = CLASSIFICATION_RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["transaction", "network"]);
    }
}
