//! Runtime configuration types.

use sqlx::postgres::PgSslMode;
use std::net::SocketAddr;
use std::path::PathBuf;

/// File name of the embedded store inside its data directory.
pub const EMBEDDED_DB_FILE: &str = "orderdesk.db";

/// Which relational backend is active for the lifetime of the process.
#[derive(Clone, Debug)]
pub enum BackendConfig {
    /// Single-file store in `data_dir`.
    Embedded { data_dir: PathBuf },
    /// Networked server store. TLS is negotiated per `ssl_mode`; `require` encrypts without verifying the certificate.
    Server {
        database_url: String,
        ssl_mode: PgSslMode,
        max_connections: u32,
    },
}

impl BackendConfig {
    pub fn kind_name(&self) -> &'static str {
        match self {
            BackendConfig::Embedded { .. } => "embedded",
            BackendConfig::Server { .. } => "server",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub bind_addr: SocketAddr,
    /// Shared secret compared by the login endpoint.
    pub admin_password: String,
    pub static_dir: PathBuf,
    /// Exit at boot when schema provisioning fails instead of serving in a degraded state.
    pub schema_fail_fast: bool,
}
