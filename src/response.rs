//! Response helpers: flat camelCase JSON bodies.

use crate::case::row_to_wire;
use crate::store::Row;
use axum::{http::StatusCode, Json};
use serde_json::Value;

/// 201 with the created row.
pub fn created(row: Row) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(row_to_wire(row)))
}

pub fn ok_one(row: Row) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(row_to_wire(row)))
}

pub fn ok_many(rows: Vec<Row>) -> (StatusCode, Json<Value>) {
    let data: Vec<Value> = rows.into_iter().map(row_to_wire).collect();
    (StatusCode::OK, Json(Value::Array(data)))
}

/// 204, empty body.
pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
