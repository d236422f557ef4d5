//! StoreAdapter and schema provisioning against the embedded backend.
//!
//! Each test gets its own database file in a temp directory.

mod common;

use chrono::{Duration, Utc};
use orderdesk::migration::{provision, SchemaStatus};
use orderdesk::model::{CLIENTS, MEASUREMENT_TASKS, ORDERS};
use orderdesk::sql::parse_timestamp;
use orderdesk::store::BackendKind;
use orderdesk::CrudService;
use serde_json::{json, Value};
use std::collections::HashMap;

fn body(v: Value) -> HashMap<String, Value> {
    v.as_object().unwrap().clone().into_iter().collect()
}

#[tokio::test]
async fn test_provisioning_is_idempotent() {
    let (_dir, store) = common::embedded_store().await;
    assert_eq!(store.kind(), BackendKind::Embedded);
    assert_eq!(provision(&store).await, SchemaStatus::Ready);
    assert_eq!(provision(&store).await, SchemaStatus::Ready);
    store.ping().await.expect("ping");
}

#[tokio::test]
async fn test_execute_reports_inserted_id_and_rows_affected() {
    let (_dir, store) = common::embedded_store().await;
    let first = store
        .execute("INSERT INTO clients (name) VALUES ($1)", &[json!("Acme")])
        .await
        .expect("insert");
    let second = store
        .execute("INSERT INTO clients (name, phone) VALUES ($1, $2)", &[json!("Birch"), json!("555")])
        .await
        .expect("insert");
    assert_eq!(first.rows_affected, 1);
    assert!(first.inserted_id.is_some());
    assert!(second.inserted_id > first.inserted_id);

    let updated = store
        .execute("UPDATE clients SET phone = $1 WHERE name <> $2", &[json!("000"), json!("nobody")])
        .await
        .expect("update");
    assert_eq!(updated.rows_affected, 2);
    assert_eq!(updated.inserted_id, None);

    let row = store
        .fetch_one("SELECT name, phone FROM clients WHERE id = $1", &[json!(second.inserted_id)])
        .await
        .expect("fetch")
        .expect("row");
    assert_eq!(row.get("name"), Some(&json!("Birch")));
    assert_eq!(row.get("phone"), Some(&json!("000")));

    let none = store
        .fetch_one("SELECT id FROM clients WHERE id = $1", &[json!(9999)])
        .await
        .expect("fetch");
    assert!(none.is_none());
}

#[tokio::test]
async fn test_literal_dollar_text_is_not_a_placeholder() {
    let (_dir, store) = common::embedded_store().await;
    store
        .execute("INSERT INTO clients (name, address) VALUES ($1, '$2 Main St')", &[json!("Quote Co")])
        .await
        .expect("insert");
    let rows = store
        .fetch_many("SELECT address FROM clients WHERE name = $1", &[json!("Quote Co")])
        .await
        .expect("fetch");
    assert_eq!(rows[0].get("address"), Some(&json!("$2 Main St")));
}

#[tokio::test]
async fn test_rows_are_normalised() {
    let (_dir, store) = common::embedded_store().await;
    let client = CrudService::create(&store, &CLIENTS, &body(json!({"name": "Acme"})))
        .await
        .expect("client");
    let client_id = client["id"].as_i64().unwrap();
    let order = CrudService::create(
        &store,
        &ORDERS,
        &body(json!({
            "client_id": client_id,
            "agreed_price": 1000,
            "paid_price": null,
            "due_datetime": "2026-03-04T10:30:00Z"
        })),
    )
    .await
    .expect("order");

    assert_eq!(order["is_active"], json!(true));
    assert_eq!(order["status"], json!("Pending"));
    assert_eq!(order["agreed_price"], json!(1000.0));
    assert_eq!(order["paid_price"], Value::Null);
    assert_eq!(order["due_datetime"], json!("2026-03-04T10:30:00.000Z"));
    assert_eq!(order["client_name"], json!("Acme"));
    let created_at = order["created_at"].as_str().expect("created_at text");
    assert!(created_at.ends_with('Z'), "{}", created_at);
    assert!(parse_timestamp(created_at).is_some());
}

#[tokio::test]
async fn test_update_refreshes_updated_at() {
    let (_dir, store) = common::embedded_store().await;
    let client = store
        .execute("INSERT INTO clients (name) VALUES ($1)", &[json!("Acme")])
        .await
        .expect("client");
    let order = store
        .execute(
            "INSERT INTO orders (client_id, updated_at) VALUES ($1, $2)",
            &[json!(client.inserted_id), json!("2000-01-01T00:00:00Z")],
        )
        .await
        .expect("order");
    let id = order.inserted_id.unwrap();

    let updated = CrudService::update(&store, &ORDERS, id, &body(json!({"status": "Confirmed"})))
        .await
        .expect("update")
        .expect("row");
    assert_eq!(updated["status"], json!("Confirmed"));
    let at = parse_timestamp(updated["updated_at"].as_str().unwrap()).unwrap();
    assert!(at > Utc::now() - Duration::minutes(5), "updated_at not refreshed: {}", at);
}

#[tokio::test]
async fn test_constraint_violations_surface_as_errors() {
    let (_dir, store) = common::embedded_store().await;
    let missing_client = CrudService::create(&store, &ORDERS, &body(json!({"client_id": 42}))).await;
    assert!(missing_client.is_err());

    CrudService::create(&store, &CLIENTS, &body(json!({"name": "Dup"}))).await.expect("first");
    let dup = CrudService::create(&store, &CLIENTS, &body(json!({"name": "Dup"}))).await;
    assert!(dup.is_err());

    let client = CrudService::list(&store, &CLIENTS, &[]).await.expect("list");
    let bad_status = CrudService::create(
        &store,
        &ORDERS,
        &body(json!({"client_id": client[0]["id"], "status": "Shipped"})),
    )
    .await;
    assert!(bad_status.is_err());
}

#[tokio::test]
async fn test_deleting_client_cascades() {
    let (_dir, store) = common::embedded_store().await;
    let client = CrudService::create(&store, &CLIENTS, &body(json!({"name": "Acme"}))).await.unwrap();
    let client_id = client["id"].clone();
    CrudService::create(&store, &ORDERS, &body(json!({"client_id": client_id}))).await.unwrap();
    CrudService::create(
        &store,
        &MEASUREMENT_TASKS,
        &body(json!({"client_id": client_id, "task_datetime": "2026-05-01T09:00:00Z"})),
    )
    .await
    .unwrap();

    let removed = CrudService::delete(&store, &CLIENTS, client_id.as_i64().unwrap()).await.unwrap();
    assert!(removed);
    assert!(CrudService::list(&store, &ORDERS, &[]).await.unwrap().is_empty());
    assert!(CrudService::list(&store, &MEASUREMENT_TASKS, &[]).await.unwrap().is_empty());
    assert!(!CrudService::delete(&store, &CLIENTS, client_id.as_i64().unwrap()).await.unwrap());
}

#[tokio::test]
async fn test_list_filters_by_client() {
    let (_dir, store) = common::embedded_store().await;
    let a = CrudService::create(&store, &CLIENTS, &body(json!({"name": "A"}))).await.unwrap();
    let b = CrudService::create(&store, &CLIENTS, &body(json!({"name": "B"}))).await.unwrap();
    for c in [&a, &b, &b] {
        CrudService::create(&store, &ORDERS, &body(json!({"client_id": c["id"]}))).await.unwrap();
    }
    let filters = vec![("client_id".to_string(), b["id"].clone())];
    let rows = CrudService::list(&store, &ORDERS, &filters).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["client_name"] == json!("B")));
}

#[tokio::test]
async fn test_repeated_updates_keep_numeric_values() {
    let (_dir, store) = common::embedded_store().await;
    let client = CrudService::create(&store, &CLIENTS, &body(json!({"name": "Acme"}))).await.unwrap();
    let order = CrudService::create(
        &store,
        &ORDERS,
        &body(json!({"client_id": client["id"], "agreed_price": 1000})),
    )
    .await
    .unwrap();
    let id = order["id"].as_i64().unwrap();
    let mut seen = Vec::new();
    for value in [json!(1250.5), json!(null), json!(300)] {
        let row = CrudService::update(&store, &ORDERS, id, &body(json!({"agreed_price": value})))
            .await
            .unwrap()
            .unwrap();
        seen.push(row["agreed_price"].clone());
    }
    assert_eq!(seen, vec![json!(1250.5), Value::Null, json!(300.0)]);
}

#[tokio::test]
async fn test_date_time_spellings_are_stored_canonically() {
    let (_dir, store) = common::embedded_store().await;
    let client = CrudService::create(&store, &CLIENTS, &body(json!({"name": "Acme"}))).await.unwrap();
    for (input, canonical) in [
        ("2030-05-01 09:00:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01 09:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01T11:00:00+02:00", "2030-05-01T09:00:00.000Z"),
        ("2030-05-01", "2030-05-01T00:00:00.000Z"),
    ] {
        let task = CrudService::create(
            &store,
            &MEASUREMENT_TASKS,
            &body(json!({"client_id": client["id"], "task_datetime": input})),
        )
        .await
        .unwrap();
        assert_eq!(task["task_datetime"], json!(canonical), "{}", input);
        let raw = store
            .fetch_one("SELECT task_datetime FROM measurement_tasks WHERE id = $1", &[task["id"].clone()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw["task_datetime"], json!(canonical), "{}", input);
    }
}
