//! Failover executor.
//!
//! # Responsibilities
//! - Run an operation against the pool's current endpoint
//! - Classify each failure and decide whether another endpoint may help
//! - Rotate the shared pool and retry, bounded by attempts
//!
//! # Design Decisions
//! - No backoff: switching endpoints is the mitigation
//! - Attempt N+1 never starts before attempt N has been classified
//! - Does not guarantee every endpoint is tried when `max_attempts < pool size`

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::config::RetryConfig;
use crate::endpoints::{Endpoint, EndpointPool};
use crate::observability::metrics;
use crate::resilience::classifier::{classify, ErrorClass};

/// Retry driver over an injected endpoint pool.
#[derive(Debug, Clone)]
pub struct FailoverExecutor {
    pool: Arc<EndpointPool>,
    max_attempts: u32,
}

impl FailoverExecutor {
    /// Create an executor with an explicit attempt bound.
    pub fn new(pool: Arc<EndpointPool>, max_attempts: u32) -> Self {
        Self { pool, max_attempts }
    }

    /// Create an executor from retry configuration.
    pub fn from_config(pool: Arc<EndpointPool>, config: &RetryConfig) -> Self {
        Self::new(pool, config.max_attempts)
    }

    /// The pool this executor rotates.
    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation`, rotating endpoints on retryable network failures.
    ///
    /// Returns the first success, or the last observed error once the error
    /// is not retryable or attempts are exhausted.
    pub async fn run<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(Endpoint) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let endpoint = self.pool.current();
            tracing::debug!(
                operation = operation_name,
                attempt = attempt + 1,
                max_attempts = max_attempts,
                endpoint = %endpoint,
                "Running attempt"
            );

            let error = match operation(endpoint.clone()).await {
                Ok(value) => {
                    metrics::record_attempt("success");
                    if attempt > 0 {
                        tracing::info!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            endpoint = %endpoint,
                            "Operation succeeded after failover"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            let class = classify(&error);
            metrics::record_attempt(&class.to_string());

            if class == ErrorClass::RetryableNetwork && attempt < max_attempts - 1 {
                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    endpoint = %endpoint,
                    error = %error,
                    "Network failure, failing over"
                );
                self.pool.advance();
                attempt += 1;
                continue;
            }

            tracing::error!(
                operation = operation_name,
                attempts = attempt + 1,
                endpoint = %endpoint,
                class = %class,
                error = %error,
                "Giving up"
            );
            return Err(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn pool(n: usize) -> Arc<EndpointPool> {
        let urls: Vec<String> = (0..n).map(|i| format!("http://10.0.0.{}:1317", i + 1)).collect();
        Arc::new(EndpointPool::from_urls(&urls, 1).unwrap())
    }

    #[tokio::test]
    async fn test_exhausts_attempts_on_network_errors() {
        let pool = pool(5);
        let executor = FailoverExecutor::new(pool.clone(), 3);
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = executor
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("connection refused".to_string()) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "connection refused");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two rotations from index 0
        assert_eq!(pool.cursor(), 2);
    }

    #[tokio::test]
    async fn test_transaction_error_fails_fast() {
        let pool = pool(3);
        let executor = FailoverExecutor::new(pool.clone(), 3);
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = executor
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("insufficient funds: 10uosmo is smaller than 20uosmo".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.cursor(), 0);
    }

    #[tokio::test]
    async fn test_unknown_error_fails_fast() {
        let pool = pool(3);
        let executor = FailoverExecutor::new(pool.clone(), 3);
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = executor
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("unexpected EOF in protobuf".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.cursor(), 0);
    }

    #[tokio::test]
    async fn test_single_attempt_never_rotates() {
        let pool = pool(3);
        let executor = FailoverExecutor::new(pool.clone(), 1);
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = executor
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("HTTP 503: service unavailable".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.cursor(), 0);
    }

    #[tokio::test]
    async fn test_succeeds_on_next_endpoint() {
        let pool = pool(3);
        let executor = FailoverExecutor::new(pool.clone(), 3);

        let result: Result<String, String> = executor
            .run("test", |endpoint| async move {
                if endpoint.to_string() == "http://10.0.0.1:1317" {
                    Err("request timed out".to_string())
                } else {
                    Ok(endpoint.to_string())
                }
            })
            .await;

        assert_eq!(result.unwrap(), "http://10.0.0.2:1317");
        assert_eq!(pool.cursor(), 1);
    }

    #[tokio::test]
    async fn test_attempts_bounded_by_config_not_pool_size() {
        let pool = pool(2);
        let executor = FailoverExecutor::new(pool.clone(), 5);
        let calls = AtomicU32::new(0);

        let _: Result<(), String> = executor
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("HTTP 429: too many requests".to_string()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // Four rotations over two endpoints land back on the first
        assert_eq!(pool.cursor(), 0);
    }
}
