//! Common routes: health, readiness, version, OpenAPI document.

use crate::migration::SchemaStatus;
use crate::service::dashboard::{DashboardPayload, EventKind, Kpis, MonthlyFinancials, StatusCount, UpcomingEvent};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::dashboard::dashboard),
    components(schemas(DashboardPayload, Kpis, StatusCount, MonthlyFinancials, UpcomingEvent, EventKind)),
    tags((name = "dashboard", description = "Business overview"))
)]
pub struct ApiDoc;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
    #[serde(flatten)]
    schema: SchemaStatus,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// 503 when the store is unreachable or provisioning failed at boot.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let database = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "readiness ping failed");
            "unavailable"
        }
    };
    let schema = (*state.schema).clone();
    let healthy = database == "ok" && schema.is_ready();
    let (code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (code, Json(ReadyBody { status, database, schema }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// GET /health, /ready, /version, /api-docs/openapi.json.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/api-docs/openapi.json", get(openapi))
        .with_state(state)
}
