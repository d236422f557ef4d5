//! Key case at the HTTP boundary: clients send and receive camelCase, columns are snake_case.

use crate::store::Row;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// "client_name" -> "clientName"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// "dueDatetime" -> "due_datetime"; already-snake input is unchanged.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Store row to response object.
pub fn row_to_wire(row: Row) -> Value {
    let map: Map<String, Value> = row
        .into_iter()
        .map(|(k, v)| (to_camel_case(&k), v))
        .collect();
    Value::Object(map)
}

/// Request object to column-keyed body. Later keys win when two spellings collide.
pub fn wire_to_columns(obj: Map<String, Value>) -> HashMap<String, Value> {
    obj.into_iter().map(|(k, v)| (to_snake_case(&k), v)).collect()
}
