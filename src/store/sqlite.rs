//! Embedded single-file backend. Placeholders become `?n`; inserted ids come from `last_insert_rowid()`.

use super::{float_value, BackendKind, ExecResult, Row, StoreBackend};
use crate::config::EMBEDDED_DB_FILE;
use crate::error::AppError;
use crate::sql::placeholder::to_numbered_question;
use crate::sql::{format_timestamp, parse_timestamp, BindValue};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use std::borrow::Cow;
use std::path::Path;

const MAX_CONNECTIONS: u32 = 5;

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (creating if needed) `<data_dir>/orderdesk.db` with foreign keys enforced.
    pub async fn open(data_dir: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(EMBEDDED_DB_FILE);
        let opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(opts)
            .await
            .map_err(AppError::Connectivity)?;
        tracing::info!(path = %path.display(), "embedded store opened");
        Ok(SqliteBackend { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        SqliteBackend { pool }
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for p in params {
        query = query.bind(p.clone());
    }
    query
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn translate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        to_numbered_question(sql)
    }

    async fn execute(&self, sql: &str, params: &[BindValue]) -> Result<ExecResult, sqlx::Error> {
        let result = bind_all(sqlx::query(sql), params).execute(&self.pool).await?;
        let inserted_id = if super::is_plain_insert(sql) && result.rows_affected() > 0 {
            Some(result.last_insert_rowid())
        } else {
            None
        };
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            inserted_id,
        })
    }

    async fn fetch_optional(&self, sql: &str, params: &[BindValue]) -> Result<Option<Row>, sqlx::Error> {
        let row = bind_all(sqlx::query(sql), params).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_json).transpose()
    }

    async fn fetch_all(&self, sql: &str, params: &[BindValue]) -> Result<Vec<Row>, sqlx::Error> {
        let rows = bind_all(sqlx::query(sql), params).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await
    }
}

fn row_to_json(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut map = Row::new();
    for (idx, col) in row.columns().iter().enumerate() {
        let declared = col.type_info().name().to_ascii_uppercase();
        map.insert(col.name().to_string(), cell_to_value(row, idx, &declared)?);
    }
    Ok(map)
}

/// Declared column type decides booleans and timestamps; everything else follows the stored value's class.
fn cell_to_value(row: &SqliteRow, idx: usize, declared: &str) -> Result<Value, sqlx::Error> {
    let storage = {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };
    Ok(match declared {
        "BOOLEAN" | "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "DATETIME" | "TIMESTAMP" | "DATE" if storage == "TEXT" => {
            let text = row.try_get::<String, _>(idx)?;
            match parse_timestamp(&text) {
                Some(ts) => Value::String(format_timestamp(&ts)),
                None => Value::String(text),
            }
        }
        _ => match storage.as_str() {
            "INTEGER" => Value::from(row.try_get::<i64, _>(idx)?),
            "REAL" => float_value(row.try_get::<f64, _>(idx)?),
            "BLOB" => Value::String(String::from_utf8_lossy(&row.try_get::<Vec<u8>, _>(idx)?).into_owned()),
            _ => Value::String(row.try_get::<String, _>(idx)?),
        },
    })
}
