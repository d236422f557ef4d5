//! Networked server backend. Placeholders pass through; inserted ids come from `RETURNING id`.

use super::{float_value, is_plain_insert, BackendKind, ExecResult, Row, StoreBackend};
use crate::sql::{format_timestamp, BindValue};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};
use std::str::FromStr;

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Connect with the given TLS mode. `Require` encrypts without verifying the server certificate.
    pub async fn connect(database_url: &str, ssl_mode: PgSslMode, max_connections: u32) -> Result<Self, sqlx::Error> {
        let opts = PgConnectOptions::from_str(database_url)?.ssl_mode(ssl_mode);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;
        Ok(PostgresBackend { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PostgresBackend { pool }
    }
}

/// Parameter types follow each value (INT8, FLOAT8, untyped NULL, ...), so one statement text can be
/// prepared with different types from call to call. The server-side statement cache is keyed by text
/// alone, so statements here are never persisted.
fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[BindValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = query.bind(p.clone());
    }
    query.persistent(false)
}

#[async_trait]
impl StoreBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Server
    }

    async fn execute(&self, sql: &str, params: &[BindValue]) -> Result<ExecResult, sqlx::Error> {
        if is_plain_insert(sql) {
            let sql = format!("{} RETURNING id", sql.trim_end().trim_end_matches(';'));
            let rows = bind_all(sqlx::query(&sql), params).fetch_all(&self.pool).await?;
            let inserted_id = match rows.first() {
                Some(row) => Some(row.try_get::<i64, _>("id")?),
                None => None,
            };
            return Ok(ExecResult {
                rows_affected: rows.len() as u64,
                inserted_id,
            });
        }
        let result = bind_all(sqlx::query(sql), params).execute(&self.pool).await?;
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            inserted_id: None,
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

fn row_to_json(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut map = Row::new();
    for (idx, col) in row.columns().iter().enumerate() {
        let v = cell_to_value(row, idx, col.type_info().name())?;
        map.insert(col.name().to_string(), v);
    }
    Ok(map)
}

fn cell_to_value(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    Ok(match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool).unwrap_or(Value::Null),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from).unwrap_or(Value::Null),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from).unwrap_or(Value::Null),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from).unwrap_or(Value::Null),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|n| float_value(n as f64))
            .unwrap_or(Value::Null),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(float_value).unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|ts| Value::String(format_timestamp(&ts)))
            .unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|ts| Value::String(format_timestamp(&ts.and_utc())))
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?.unwrap_or(Value::Null),
        _ => row.try_get::<Option<String>, _>(idx)?.map(Value::String).unwrap_or(Value::Null),
    })
}
