//! Generic CRUD execution through the StoreAdapter.

use crate::model::EntityDef;
use crate::sql::{delete, insert, select_by_id, select_list, update};
use crate::store::{Row, StoreAdapter};
use serde_json::Value;
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// List rows with optional exact-match filters, in the entity's display order.
    pub async fn list(
        store: &StoreAdapter,
        entity: &EntityDef,
        filters: &[(String, Value)],
    ) -> Result<Vec<Row>, sqlx::Error> {
        let q = select_list(entity, filters);
        store.fetch_many(&q.sql, &q.params).await
    }

    /// Fetch one row by id (joined with the client name where the entity has one).
    pub async fn read(store: &StoreAdapter, entity: &EntityDef, id: i64) -> Result<Option<Row>, sqlx::Error> {
        let q = select_by_id(entity);
        store.fetch_one(&q.sql, &[Value::from(id)]).await
    }

    /// Insert one row and return it as re-read by its new id.
    pub async fn create(
        store: &StoreAdapter,
        entity: &EntityDef,
        body: &HashMap<String, Value>,
    ) -> Result<Row, sqlx::Error> {
        let q = insert(entity, body);
        let result = store.execute(&q.sql, &q.params).await?;
        let id = result.inserted_id.ok_or(sqlx::Error::RowNotFound)?;
        tracing::info!(entity = entity.label, id, "created");
        Self::read(store, entity, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Update one row by id. None when no row has that id.
    pub async fn update(
        store: &StoreAdapter,
        entity: &EntityDef,
        id: i64,
        body: &HashMap<String, Value>,
    ) -> Result<Option<Row>, sqlx::Error> {
        if let Some(q) = update(entity, id, body) {
            let result = store.execute(&q.sql, &q.params).await?;
            if result.rows_affected == 0 {
                return Ok(None);
            }
            tracing::info!(entity = entity.label, id, "updated");
        }
        Self::read(store, entity, id).await
    }

    /// Delete one row by id. Returns whether a row was removed; dependants go with it via cascade.
    pub async fn delete(store: &StoreAdapter, entity: &EntityDef, id: i64) -> Result<bool, sqlx::Error> {
        let q = delete(entity, id);
        let result = store.execute(&q.sql, &q.params).await?;
        if result.rows_affected > 0 {
            tracing::info!(entity = entity.label, id, "deleted");
        }
        Ok(result.rows_affected > 0)
    }
}
