//! Server settings loaded via OrthoConfig.
//!
//! Values come from `GUIDE_*` environment variables, an optional config file
//! and command-line flags, in increasing order of precedence.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::data_context::DEFAULT_COMMIT_ATTEMPTS;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;

/// Configuration for the guide HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GUIDE")]
pub struct ServerSettings {
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Rows are kept in memory when unset.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Attempts per commit when the store reports a transient failure.
    pub commit_attempts: Option<u32>,
    /// Keep `exceptionMessage` in failed responses.
    #[ortho_config(default = false)]
    pub expose_diagnostics: bool,
    /// JSON role map enabling permission enforcement.
    pub role_permissions_file: Option<PathBuf>,
}

impl ServerSettings {
    /// Configured bind address, or `0.0.0.0:8080`.
    ///
    /// # Errors
    /// Fails when the configured value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR).parse()
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// Commit attempts, never fewer than one.
    pub fn commit_attempts(&self) -> u32 {
        self.commit_attempts.unwrap_or(DEFAULT_COMMIT_ATTEMPTS).max(1)
    }
}
