//! Builds parameterized INSERT, SELECT, UPDATE, DELETE for an entity, in canonical `$n` notation.

use crate::model::EntityDef;
use crate::sql::timestamp::{format_timestamp, parse_timestamp};
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier (safe: only from static entity descriptors).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// SELECT list and FROM clause; joined entities expose the owning client's name as `client_name`.
fn select_from(entity: &EntityDef) -> String {
    let a = entity.alias;
    let mut cols: Vec<String> = entity
        .columns
        .iter()
        .map(|c| format!("{}.{}", a, quoted(c)))
        .collect();
    if entity.joins_client {
        cols.push(format!("cl.{} AS {}", quoted("name"), quoted("client_name")));
        format!(
            "SELECT {} FROM {} {} JOIN {} cl ON cl.{} = {}.{}",
            cols.join(", "),
            quoted(entity.table),
            a,
            quoted("clients"),
            quoted("id"),
            a,
            quoted("client_id")
        )
    } else {
        format!("SELECT {} FROM {} {}", cols.join(", "), quoted(entity.table), a)
    }
}

/// SELECT by id. Caller adds id as sole param.
pub fn select_by_id(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("{} WHERE {}.{} = $1", select_from(entity), entity.alias, quoted("id"));
    q
}

/// SELECT list with optional exact-match filters on the entity's filterable columns.
pub fn select_list(entity: &EntityDef, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if entity.filterable.contains(&col.as_str()) {
            let n = q.push_param(val.clone());
            where_parts.push(format!("{}.{} = ${}", entity.alias, quoted(col), n));
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "{}{} ORDER BY {}.{}, {}.{}",
        select_from(entity),
        where_clause,
        entity.alias,
        order_by_clause(entity.order_by),
        entity.alias,
        quoted("id")
    );
    q
}

fn order_by_clause(order_by: &str) -> String {
    let mut parts = order_by.split_whitespace();
    let col = parts.next().unwrap_or("id");
    match parts.next() {
        Some(dir) => format!("{} {}", quoted(col), dir),
        None => quoted(col),
    }
}

/// Any date-time spelling accepted for a timestamp column becomes canonical RFC 3339 text,
/// which both backends bind as a timestamp. Other values pass through.
fn column_value(entity: &EntityDef, column: &str, val: &Value) -> Value {
    if entity.timestamps.contains(&column) {
        if let Some(ts) = val.as_str().and_then(parse_timestamp) {
            return Value::String(format_timestamp(&ts));
        }
    }
    val.clone()
}

/// INSERT of the writable columns present in body. Columns omitted from body keep their store default.
pub fn insert(entity: &EntityDef, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for name in entity.writable {
        let Some(val) = body.get(*name) else { continue };
        let n = q.push_param(column_value(entity, name, val));
        cols.push(quoted(name));
        placeholders.push(format!("${}", n));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quoted(entity.table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(entity.table),
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    q
}

/// UPDATE by id: SET only writable columns present in body. None when there is nothing to set.
/// `updated_at` is left to the store trigger.
pub fn update(entity: &EntityDef, id: i64, body: &HashMap<String, Value>) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for name in entity.writable {
        let Some(val) = body.get(*name) else { continue };
        let n = q.push_param(column_value(entity, name, val));
        sets.push(format!("{} = ${}", quoted(name), n));
    }
    if sets.is_empty() {
        return None;
    }
    let id_param = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        quoted(entity.table),
        sets.join(", "),
        quoted("id"),
        id_param
    );
    Some(q)
}

/// DELETE by id.
pub fn delete(entity: &EntityDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(Value::from(id));
    q.sql = format!("DELETE FROM {} WHERE {} = $1", quoted(entity.table), quoted("id"));
    q
}
