//! Load [`AppConfig`] from the process environment.

use crate::config::types::{AppConfig, BackendConfig};
use crate::error::ConfigError;
use sqlx::postgres::PgSslMode;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

pub mod env {
    pub const STORE_BACKEND: &str = "STORE_BACKEND";
    pub const DATA_DIR: &str = "DATA_DIR";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DATABASE_SSL_MODE: &str = "DATABASE_SSL_MODE";
    pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
    pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
    pub const BIND_ADDR: &str = "BIND_ADDR";
    pub const STATIC_DIR: &str = "STATIC_DIR";
    pub const SCHEMA_FAIL_FAST: &str = "SCHEMA_FAIL_FAST";
}

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_STATIC_DIR: &str = "public";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Read configuration from `std::env`. Call `dotenvy::dotenv()` first if a `.env` file should apply.
pub fn from_env() -> Result<AppConfig, ConfigError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    from_vars(&vars)
}

/// Build configuration from an explicit variable map. Empty values count as unset.
pub fn from_vars(vars: &HashMap<String, String>) -> Result<AppConfig, ConfigError> {
    let get = |key: &str| {
        vars.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let backend = match get(env::STORE_BACKEND).map(str::to_ascii_lowercase).as_deref() {
        None | Some("embedded") | Some("sqlite") | Some("file") => BackendConfig::Embedded {
            data_dir: PathBuf::from(get(env::DATA_DIR).unwrap_or(DEFAULT_DATA_DIR)),
        },
        Some("server") | Some("postgres") | Some("pg") => {
            let database_url = get(env::DATABASE_URL)
                .ok_or(ConfigError::Missing(env::DATABASE_URL))?
                .to_string();
            let ssl_mode = match get(env::DATABASE_SSL_MODE) {
                Some(s) => PgSslMode::from_str(s).map_err(|e| ConfigError::Invalid {
                    key: env::DATABASE_SSL_MODE,
                    reason: e.to_string(),
                })?,
                None => PgSslMode::Require,
            };
            let max_connections = match get(env::DATABASE_MAX_CONNECTIONS) {
                Some(s) => s.parse::<u32>().map_err(|e| ConfigError::Invalid {
                    key: env::DATABASE_MAX_CONNECTIONS,
                    reason: e.to_string(),
                })?,
                None => DEFAULT_MAX_CONNECTIONS,
            };
            BackendConfig::Server {
                database_url,
                ssl_mode,
                max_connections,
            }
        }
        Some(other) => {
            return Err(ConfigError::Invalid {
                key: env::STORE_BACKEND,
                reason: format!("unknown backend '{}' (expected embedded or server)", other),
            })
        }
    };

    let admin_password = get(env::ADMIN_PASSWORD)
        .ok_or(ConfigError::Missing(env::ADMIN_PASSWORD))?
        .to_string();

    let bind_addr = get(env::BIND_ADDR)
        .unwrap_or(DEFAULT_BIND_ADDR)
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: env::BIND_ADDR,
            reason: e.to_string(),
        })?;

    let schema_fail_fast = match get(env::SCHEMA_FAIL_FAST) {
        Some(s) => parse_bool(s).ok_or_else(|| ConfigError::Invalid {
            key: env::SCHEMA_FAIL_FAST,
            reason: format!("expected true or false, got '{}'", s),
        })?,
        None => false,
    };

    Ok(AppConfig {
        backend,
        bind_addr,
        admin_password,
        static_dir: PathBuf::from(get(env::STATIC_DIR).unwrap_or(DEFAULT_STATIC_DIR)),
        schema_fail_fast,
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_to_embedded_store() {
        let cfg = from_vars(&vars(&[(env::ADMIN_PASSWORD, "secret")])).unwrap();
        match cfg.backend {
            BackendConfig::Embedded { data_dir } => assert_eq!(data_dir, PathBuf::from("./data")),
            other => panic!("unexpected backend {:?}", other),
        }
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert!(!cfg.schema_fail_fast);
    }

    #[test]
    fn server_backend_requires_url() {
        let err = from_vars(&vars(&[
            (env::STORE_BACKEND, "server"),
            (env::ADMIN_PASSWORD, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(env::DATABASE_URL)));
    }

    #[test]
    fn server_backend_defaults_to_require_tls() {
        let cfg = from_vars(&vars(&[
            (env::STORE_BACKEND, "postgres"),
            (env::DATABASE_URL, "postgres://localhost/orderdesk"),
            (env::ADMIN_PASSWORD, "secret"),
        ]))
        .unwrap();
        match cfg.backend {
            BackendConfig::Server {
                ssl_mode,
                max_connections,
                ..
            } => {
                assert!(matches!(ssl_mode, PgSslMode::Require));
                assert_eq!(max_connections, 5);
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_backend_and_missing_secret() {
        let err = from_vars(&vars(&[
            (env::STORE_BACKEND, "mongo"),
            (env::ADMIN_PASSWORD, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: env::STORE_BACKEND, .. }));

        let err = from_vars(&vars(&[(env::ADMIN_PASSWORD, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(env::ADMIN_PASSWORD)));
    }
}
