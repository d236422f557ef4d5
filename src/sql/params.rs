//! Convert serde_json::Value to types that sqlx can bind on either backend.

use crate::sql::timestamp::{format_timestamp, looks_like_timestamp, parse_timestamp};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{types::Oid, PgTypeInfo, Postgres};
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::{Database, Type};

/// A scalar statement parameter. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else {
                    BindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) if looks_like_timestamp(s) => match parse_timestamp(s) {
                Some(ts) => BindValue::Timestamp(ts),
                None => BindValue::String(s.clone()),
            },
            Value::String(s) => BindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null => IsNull::Yes,
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            BindValue::Timestamp(ts) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(ts, buf)?,
            BindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    /// Declare the wire type per value. NULL goes out untyped (oid 0) so the server infers it from the column.
    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            BindValue::Null => PgTypeInfo::with_oid(Oid(0)),
            BindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            BindValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            BindValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            BindValue::String(_) => <String as Type<Postgres>>::type_info(),
            BindValue::Timestamp(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
            BindValue::Json(_) => <serde_json::Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}

impl<'q> Encode<'q, Sqlite> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null => <Option<i64> as Encode<Sqlite>>::encode_by_ref(&None, buf)?,
            BindValue::Bool(b) => <bool as Encode<Sqlite>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf)?,
            BindValue::F64(n) => <f64 as Encode<Sqlite>>::encode_by_ref(n, buf)?,
            BindValue::String(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf)?,
            BindValue::Timestamp(ts) => {
                <String as Encode<Sqlite>>::encode_by_ref(&format_timestamp(ts), buf)?
            }
            BindValue::Json(v) => <String as Encode<Sqlite>>::encode_by_ref(&v.to_string(), buf)?,
        })
    }
}

impl Type<Sqlite> for BindValue {
    fn type_info() -> SqliteTypeInfo {
        <str as Type<Sqlite>>::type_info()
    }

    fn compatible(_ty: &SqliteTypeInfo) -> bool {
        true
    }
}
