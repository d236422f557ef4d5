//! Entity CRUD handlers: list, create, read, update, delete for clients, orders and measurement tasks.

use crate::case::{to_snake_case, wire_to_columns};
use crate::error::{AppError, StoreResultExt};
use crate::model::{entity_by_path, EntityDef};
use crate::response::{created, no_content, ok_many, ok_one};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn lookup(path_segment: &str) -> Result<&'static EntityDef, AppError> {
    entity_by_path(path_segment).ok_or_else(|| AppError::NotFound(format!("resource '{}'", path_segment)))
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

fn body_to_columns(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(wire_to_columns(m)),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Query-string filters keyed by column; values are typed so both stores compare like for like.
fn query_filters(entity: &EntityDef, params: HashMap<String, String>) -> Vec<(String, Value)> {
    let mut filters: Vec<(String, Value)> = params
        .into_iter()
        .map(|(k, v)| (to_snake_case(&k), v))
        .filter(|(k, _)| entity.filterable.contains(&k.as_str()))
        .map(|(k, v)| {
            let val = if k.ends_with("_id") {
                v.parse::<i64>().map(Value::from).unwrap_or(Value::String(v))
            } else if k.starts_with("is_") {
                match v.to_ascii_lowercase().as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" => Value::Bool(false),
                    _ => Value::String(v),
                }
            } else {
                Value::String(v)
            };
            (k, val)
        })
        .collect();
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    filters
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let entity = lookup(&path_segment)?;
    let filters = query_filters(entity, params);
    let rows = CrudService::list(&state.store, entity, &filters)
        .await
        .context(&format!("Failed to fetch {}", path_segment))?;
    Ok(ok_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let entity = lookup(&path_segment)?;
    let body = body_to_columns(body)?;
    let row = CrudService::create(&state.store, entity, &body)
        .await
        .context(&format!("Failed to create {}", entity.label))?;
    Ok(created(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let entity = lookup(&path_segment)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.store, entity, id)
        .await
        .context(&format!("Failed to fetch {}", entity.label))?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.label, id)))?;
    Ok(ok_one(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let entity = lookup(&path_segment)?;
    let id = parse_id(&id_str)?;
    let body = body_to_columns(body)?;
    let row = CrudService::update(&state.store, entity, id, &body)
        .await
        .context(&format!("Failed to update {}", entity.label))?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.label, id)))?;
    Ok(ok_one(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let entity = lookup(&path_segment)?;
    let id = parse_id(&id_str)?;
    let removed = CrudService::delete(&state.store, entity, id)
        .await
        .context(&format!("Failed to delete {}", entity.label))?;
    if !removed {
        return Err(AppError::NotFound(format!("{} {}", entity.label, id)));
    }
    Ok(no_content())
}
