//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation against pool.current()
//!     → failover.rs (run attempt, bounded by max_attempts)
//!     → On error: classifier.rs (RetryableNetwork / NonRetryableTransaction / Unknown)
//!     → RetryableNetwork with attempts left: pool.advance(), retry immediately
//!     → Anything else: surface the last error unchanged
//! ```
//!
//! # Design Decisions
//! - Rotation to a fresh endpoint replaces backoff; there is no sleep between attempts
//! - The bound is on attempts, not wall-clock time
//! - Transaction-error patterns always win over network patterns
//! - Unknown errors fail fast so unexpected failures are never masked as transient
//! - Only raised errors are intercepted; a broadcast with a non-zero code is a result

pub mod classifier;
pub mod failover;

pub use classifier::{classify, ErrorClass};
pub use failover::FailoverExecutor;
