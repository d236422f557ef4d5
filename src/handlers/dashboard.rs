//! Dashboard handler.

use crate::error::{AppError, StoreResultExt};
use crate::service::dashboard::DashboardPayload;
use crate::state::AppState;
use axum::{extract::State, Json};

/// Recomputed on every request.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "KPIs, status histogram, monthly financials and upcoming events", body = DashboardPayload),
        (status = 500, description = "One of the underlying reads failed")
    )
)]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardPayload>, AppError> {
    let payload = state
        .dashboard
        .compute()
        .await
        .context("Failed to load dashboard data")?;
    Ok(Json(payload))
}
