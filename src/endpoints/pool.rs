//! Endpoint pool with a shared rotation cursor.
//!
//! # Responsibilities
//! - Hold the ordered endpoint list loaded from configuration
//! - Expose the currently selected endpoint
//! - Rotate forward on network failure, wrapping at the end of the list

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::endpoints::Endpoint;
use crate::observability::metrics;

/// Ordered pool of node endpoints.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    /// Index of the current endpoint, always `< endpoints.len()`.
    cursor: AtomicUsize,
    /// How far `advance` moves the cursor.
    step: usize,
}

impl EndpointPool {
    /// Create a pool rotating one endpoint at a time.
    pub fn new(endpoints: Vec<Endpoint>) -> BlockchainResult<Self> {
        Self::with_step(endpoints, 1)
    }

    /// Create a pool with an explicit rotation step.
    pub fn with_step(endpoints: Vec<Endpoint>, step: usize) -> BlockchainResult<Self> {
        if endpoints.is_empty() {
            return Err(BlockchainError::Config("Endpoint pool cannot be empty".to_string()));
        }
        if step == 0 {
            return Err(BlockchainError::Config("Rotation step must be at least 1".to_string()));
        }
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
            step,
        })
    }

    /// Build a pool from raw URLs.
    pub fn from_urls<S: AsRef<str>>(urls: &[S], step: usize) -> BlockchainResult<Self> {
        let endpoints = urls
            .iter()
            .map(|u| Endpoint::parse(u.as_ref()))
            .collect::<BlockchainResult<Vec<_>>>()?;
        Self::with_step(endpoints, step)
    }

    /// The currently selected endpoint.
    pub fn current(&self) -> Endpoint {
        let idx = self.cursor.load(Ordering::Acquire);
        self.endpoints[idx].clone()
    }

    /// Rotate the cursor forward and return the new current endpoint.
    ///
    /// The read-modify-write is a single atomic update, so two concurrent
    /// failures each move the cursor and neither observes a torn index.
    pub fn advance(&self) -> Endpoint {
        let len = self.endpoints.len();
        let step = self.step % len;
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |idx| {
                Some((idx + step) % len)
            })
            .unwrap_or_else(|idx| idx);
        let next = (previous + step) % len;

        metrics::record_rotation();
        tracing::warn!(
            from = %self.endpoints[previous],
            to = %self.endpoints[next],
            "Rotating to next endpoint"
        );

        self.endpoints[next].clone()
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; construction rejects empty pools.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// All endpoints in configured order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}
