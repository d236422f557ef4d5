//! Idempotent schema provisioning: the three entity tables, their indexes, and the
//! `orders.updated_at` refresh trigger, in the dialect of the active backend.

use crate::store::{BackendKind, StoreAdapter};
use serde::Serialize;

/// Outcome of provisioning at boot, kept in application state so readiness is observable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "schema", content = "reason", rename_all = "lowercase")]
pub enum SchemaStatus {
    Ready,
    Failed(String),
}

impl SchemaStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, SchemaStatus::Ready)
    }
}

const STATUS_CHECK: &str =
    "status IN ('Pending', 'Confirmed', 'InProduction', 'Installed', 'Completed', 'Cancelled')";

fn embedded_statements() -> Vec<String> {
    vec![
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            address TEXT,
            email TEXT,
            phone TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
        .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'Pending' CHECK ({}),
                agreed_price REAL DEFAULT 0 CHECK (agreed_price >= 0),
                paid_price REAL DEFAULT 0 CHECK (paid_price >= 0),
                cost_price REAL DEFAULT 0 CHECK (cost_price >= 0),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                due_datetime DATETIME,
                last_admin_responder TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            STATUS_CHECK
        ),
        r#"
        CREATE TABLE IF NOT EXISTS measurement_tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            task_datetime DATETIME NOT NULL,
            is_completed BOOLEAN NOT NULL DEFAULT 0,
            address TEXT,
            description TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
        .to_string(),
        // AFTER trigger; recursive triggers are off by default so the inner UPDATE does not re-fire it.
        r#"
        CREATE TRIGGER IF NOT EXISTS orders_touch_updated_at
        AFTER UPDATE ON orders
        FOR EACH ROW
        BEGIN
            UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = OLD.id;
        END
        "#
        .to_string(),
    ]
}

fn server_statements() -> Vec<String> {
    vec![
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            address TEXT,
            email TEXT,
            phone TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
        .to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                client_id BIGINT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'Pending' CHECK ({}),
                agreed_price DOUBLE PRECISION DEFAULT 0 CHECK (agreed_price >= 0),
                paid_price DOUBLE PRECISION DEFAULT 0 CHECK (paid_price >= 0),
                cost_price DOUBLE PRECISION DEFAULT 0 CHECK (cost_price >= 0),
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                due_datetime TIMESTAMPTZ,
                last_admin_responder TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            STATUS_CHECK
        ),
        r#"
        CREATE TABLE IF NOT EXISTS measurement_tasks (
            id BIGSERIAL PRIMARY KEY,
            client_id BIGINT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
            task_datetime TIMESTAMPTZ NOT NULL,
            is_completed BOOLEAN NOT NULL DEFAULT FALSE,
            address TEXT,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
        .to_string(),
        r#"
        CREATE OR REPLACE FUNCTION orders_touch_updated_at() RETURNS TRIGGER AS $$
        BEGIN
            NEW.updated_at = NOW();
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#
        .to_string(),
        "DROP TRIGGER IF EXISTS orders_touch_updated_at ON orders".to_string(),
        r#"
        CREATE TRIGGER orders_touch_updated_at
        BEFORE UPDATE ON orders
        FOR EACH ROW EXECUTE FUNCTION orders_touch_updated_at()
        "#
        .to_string(),
    ]
}

const INDEX_STATEMENTS: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_orders_client_id ON orders (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_orders_active_status ON orders (is_active, status)",
    "CREATE INDEX IF NOT EXISTS idx_measurement_tasks_client_id ON measurement_tasks (client_id)",
    "CREATE INDEX IF NOT EXISTS idx_measurement_tasks_completed ON measurement_tasks (is_completed)",
];

/// DDL for the given backend, in dependency order.
pub fn schema_statements(kind: BackendKind) -> Vec<String> {
    let mut stmts = match kind {
        BackendKind::Embedded => embedded_statements(),
        BackendKind::Server => server_statements(),
    };
    stmts.extend(INDEX_STATEMENTS.iter().map(|s| s.to_string()));
    stmts
}

/// Create tables, indexes and the trigger if absent. Safe to run on every start.
/// Stops at the first failing statement and returns its error.
pub async fn provision_schema(store: &StoreAdapter) -> Result<(), sqlx::Error> {
    let kind = store.kind();
    tracing::info!(backend = ?kind, "provisioning schema");
    for sql in schema_statements(kind) {
        store.execute(&sql, &[]).await?;
    }
    tracing::info!("schema ready");
    Ok(())
}

/// Run provisioning and fold the outcome into a [`SchemaStatus`], logging failures.
pub async fn provision(store: &StoreAdapter) -> SchemaStatus {
    match provision_schema(store).await {
        Ok(()) => SchemaStatus::Ready,
        Err(e) => {
            tracing::error!(error = %e, "schema provisioning failed; serving in degraded state");
            SchemaStatus::Failed(e.to_string())
        }
    }
}
