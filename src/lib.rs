//! Payout relay library: resilient transfer broadcasting for a Cosmos chain.

pub mod blockchain;
pub mod config;
pub mod endpoints;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod settlement;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
