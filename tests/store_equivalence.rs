//! Both backends return field-equal rows for the same logical data.
//!
//! Needs a disposable server database: `TEST_DATABASE_URL=postgres://... cargo test --test store_equivalence`.
//! Without it the test returns early. The three entity tables in that database are dropped and recreated.

mod common;

use orderdesk::migration::{provision, SchemaStatus};
use orderdesk::model::{EntityDef, CLIENTS, MEASUREMENT_TASKS, ORDERS};
use orderdesk::store::PostgresBackend;
use orderdesk::{CrudService, Row, StoreAdapter};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::Arc;

fn body(v: Value) -> HashMap<String, Value> {
    v.as_object().unwrap().clone().into_iter().collect()
}

async fn server_store() -> Option<StoreAdapter> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect TEST_DATABASE_URL");
    sqlx::query("DROP TABLE IF EXISTS measurement_tasks, orders, clients CASCADE")
        .execute(&pool)
        .await
        .expect("reset tables");
    let store = StoreAdapter::new(Arc::new(PostgresBackend::from_pool(pool)));
    assert_eq!(provision(&store).await, SchemaStatus::Ready);
    Some(store)
}

/// Same writes on either backend; returns the rows read back through the entity selects.
async fn seed(store: &StoreAdapter) -> Vec<Row> {
    let client = CrudService::create(store, &CLIENTS, &body(json!({"name": "Acme", "email": "a@acme.test"})))
        .await
        .unwrap();
    let order = CrudService::create(
        store,
        &ORDERS,
        &body(json!({
            "client_id": client["id"],
            "agreed_price": 1000,
            "paid_price": 400.5,
            "cost_price": null,
            "is_active": true,
            "due_datetime": "2030-06-01T12:00:00Z"
        })),
    )
    .await
    .unwrap();
    let task = CrudService::create(
        store,
        &MEASUREMENT_TASKS,
        &body(json!({"client_id": client["id"], "task_datetime": "2030-05-01T09:15:00.250Z"})),
    )
    .await
    .unwrap();
    vec![client, order, task]
}

fn without_clock_columns(mut row: Row) -> Row {
    for col in ["created_at", "updated_at"] {
        if let Some(v) = row.remove(col) {
            assert!(v.as_str().map(|s| s.ends_with('Z')).unwrap_or(false), "{}: {}", col, v);
        }
    }
    row
}

/// Applies the same update to the same row on both stores and returns the two re-read values of `column`.
async fn update_both(
    embedded: &StoreAdapter,
    server: &StoreAdapter,
    entity: &'static EntityDef,
    id: i64,
    column: &str,
    value: Value,
) -> (Value, Value) {
    let change = HashMap::from([(column.to_string(), value)]);
    let a = CrudService::update(embedded, entity, id, &change).await.unwrap().expect("embedded row");
    let b = CrudService::update(server, entity, id, &change).await.unwrap().expect("server row");
    (a[column].clone(), b[column].clone())
}

// All phases share the server database, so they run in one test, in order.
#[tokio::test]
async fn test_backends_return_equal_rows() {
    let Some(server) = server_store().await else {
        return;
    };
    let (_dir, embedded) = common::embedded_store().await;

    let a: Vec<Row> = seed(&embedded).await.into_iter().map(without_clock_columns).collect();
    let b: Vec<Row> = seed(&server).await.into_iter().map(without_clock_columns).collect();
    assert_eq!(a, b);
    let order_id = a[1]["id"].as_i64().unwrap();
    let task_id = a[2]["id"].as_i64().unwrap();

    // One statement text, re-run with integer, float and null values in turn.
    let mut seen = Vec::new();
    for value in [json!(1250.5), json!(null), json!(300), json!(12.25), json!(0)] {
        let (emb, srv) = update_both(&embedded, &server, &ORDERS, order_id, "agreed_price", value).await;
        assert_eq!(emb, srv);
        seen.push(srv);
    }
    assert_eq!(seen, vec![json!(1250.5), Value::Null, json!(300.0), json!(12.25), json!(0.0)]);

    let (emb, srv) = update_both(&embedded, &server, &ORDERS, order_id, "is_active", json!(false)).await;
    assert_eq!((emb, srv), (json!(false), json!(false)));

    // Every date-time spelling the embedded store accepts, on update and on insert.
    let spellings = [
        ("2030-05-01 09:00:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01T09:00:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01 09:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01 09:00:00.5", "2030-05-01T09:00:00.500Z"),
        ("2030-05-01T11:00:00+02:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01", "2030-05-01T00:00:00.000Z"),
    ];
    let client_id = a[0]["id"].clone();
    for (input, canonical) in spellings {
        let (emb, srv) =
            update_both(&embedded, &server, &MEASUREMENT_TASKS, task_id, "task_datetime", json!(input)).await;
        assert_eq!(emb, json!(canonical), "{}", input);
        assert_eq!(srv, json!(canonical), "{}", input);

        let new_task = body(json!({"client_id": client_id, "task_datetime": input}));
        let emb = CrudService::create(&embedded, &MEASUREMENT_TASKS, &new_task).await.unwrap();
        let srv = CrudService::create(&server, &MEASUREMENT_TASKS, &new_task).await.unwrap();
        assert_eq!(without_clock_columns(emb), without_clock_columns(srv), "{}", input);
    }
    let (emb, srv) = update_both(&embedded, &server, &ORDERS, order_id, "due_datetime", json!(null)).await;
    assert_eq!((emb, srv), (Value::Null, Value::Null));

    let dup = CrudService::create(&server, &CLIENTS, &body(json!({"name": "Acme"}))).await;
    assert!(dup.is_err());

    let client_id = client_id.as_i64().unwrap();
    assert!(CrudService::delete(&server, &CLIENTS, client_id).await.unwrap());
    assert!(CrudService::list(&server, &ORDERS, &[]).await.unwrap().is_empty());
    assert!(CrudService::list(&server, &MEASUREMENT_TASKS, &[]).await.unwrap().is_empty());
    server.close().await;
}
