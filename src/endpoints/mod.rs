//! Endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! config.node.endpoints (ordered)
//!     → endpoint.rs (parse & normalize each URL)
//!     → pool.rs (ordered pool + rotation cursor)
//!     → FailoverExecutor reads current(), calls advance() on network failure
//! ```
//!
//! # Design Decisions
//! - Endpoints are immutable once loaded; nothing is ever evicted
//! - A failed endpoint becomes reachable again after one full rotation
//! - The cursor is advisory: concurrent requests may observe any valid index
//! - The pool is injected (`Arc<EndpointPool>`), never process-global

pub mod endpoint;
pub mod pool;

pub use endpoint::Endpoint;
pub use pool::EndpointPool;
