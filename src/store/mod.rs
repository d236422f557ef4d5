//! StoreAdapter: one query interface over the embedded file store and the networked server store.
//!
//! Statements are written once in canonical `$n` notation with params in placeholder order.
//! The active backend is chosen once at startup and injected; request code never branches on it.

mod postgres;
mod sqlite;

pub use self::postgres::PostgresBackend;
pub use self::sqlite::SqliteBackend;

use crate::config::BackendConfig;
use crate::error::AppError;
use crate::sql::BindValue;
use async_trait::async_trait;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// One result row: column name to normalised JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Outcome of a write statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Surrogate id of the inserted row, for single-row INSERTs.
    pub inserted_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Embedded,
    Server,
}

/// A concrete relational backend. Implementations normalise rows so both produce identical values.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Rewrite a canonical statement into this backend's placeholder syntax.
    fn translate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(sql)
    }

    async fn execute(&self, sql: &str, params: &[BindValue]) -> Result<ExecResult, sqlx::Error>;

    async fn fetch_optional(&self, sql: &str, params: &[BindValue]) -> Result<Option<Row>, sqlx::Error>;

    async fn fetch_all(&self, sql: &str, params: &[BindValue]) -> Result<Vec<Row>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;

    async fn close(&self);
}

/// Process-wide store handle. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct StoreAdapter {
    backend: Arc<dyn StoreBackend>,
}

impl StoreAdapter {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        StoreAdapter { backend }
    }

    /// Open the backend named by config. Failure here is a connectivity error.
    pub async fn connect(config: &BackendConfig) -> Result<Self, AppError> {
        let backend: Arc<dyn StoreBackend> = match config {
            BackendConfig::Embedded { data_dir } => Arc::new(SqliteBackend::open(data_dir).await?),
            BackendConfig::Server {
                database_url,
                ssl_mode,
                max_connections,
            } => Arc::new(
                PostgresBackend::connect(database_url, *ssl_mode, *max_connections)
                    .await
                    .map_err(AppError::Connectivity)?,
            ),
        };
        tracing::info!(backend = ?backend.kind(), "store connected");
        Ok(StoreAdapter::new(backend))
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Run a write. Errors propagate unmodified; there is no retry.
    pub async fn execute(&self, statement: &str, params: &[Value]) -> Result<ExecResult, sqlx::Error> {
        let sql = self.backend.translate(statement);
        tracing::debug!(sql = %sql, params = ?params, "execute");
        self.backend.execute(&sql, &bind_values(params)).await
    }

    /// First row of the result, if any.
    pub async fn fetch_one(&self, statement: &str, params: &[Value]) -> Result<Option<Row>, sqlx::Error> {
        let sql = self.backend.translate(statement);
        tracing::debug!(sql = %sql, params = ?params, "fetch_one");
        self.backend.fetch_optional(&sql, &bind_values(params)).await
    }

    pub async fn fetch_many(&self, statement: &str, params: &[Value]) -> Result<Vec<Row>, sqlx::Error> {
        let sql = self.backend.translate(statement);
        tracing::debug!(sql = %sql, params = ?params, "fetch_many");
        self.backend.fetch_all(&sql, &bind_values(params)).await
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.backend.ping().await
    }

    pub async fn close(&self) {
        self.backend.close().await
    }
}

fn bind_values(params: &[Value]) -> Vec<BindValue> {
    params.iter().map(BindValue::from_json).collect()
}

/// Whether `sql` is an INSERT without its own RETURNING clause.
pub(crate) fn is_plain_insert(sql: &str) -> bool {
    let head = sql.trim_start();
    head.get(..6).map(|s| s.eq_ignore_ascii_case("insert")).unwrap_or(false)
        && !head.to_ascii_uppercase().contains("RETURNING")
}

pub(crate) fn float_value(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
