//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order: config, pool, service, listener
//! - The listener binds last so traffic only arrives when ready

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::blockchain::{BlockchainError, TransferService};
use crate::config::{load_config, validate_config, AppConfig, ConfigError};
use crate::endpoints::EndpointPool;
use crate::http::HttpServer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("engine: {0}")]
    Engine(#[from] BlockchainError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration from `path`, or validated defaults without one.
pub fn load(path: Option<&Path>) -> Result<AppConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => {
            let config = AppConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Build the endpoint pool and the transfer service around it.
pub fn build_service(config: &AppConfig) -> Result<Arc<TransferService>, StartupError> {
    let pool = Arc::new(EndpointPool::from_urls(
        &config.node.endpoints,
        config.retries.rotation_step,
    )?);
    tracing::info!(
        endpoints = pool.len(),
        primary = %pool.current(),
        chain_id = %config.node.chain_id,
        max_attempts = config.retries.max_attempts,
        "Endpoint pool ready"
    );
    Ok(Arc::new(TransferService::from_config(config, pool)?))
}

/// Wire the service and bind the listener.
pub async fn bootstrap(config: &AppConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let service = build_service(config)?;
    let server = HttpServer::new(service, &config.security);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    Ok((server, listener))
}
