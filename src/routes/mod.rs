//! Router assembly.

mod common;
mod entity;

pub use common::{common_routes, ApiDoc};
pub use entity::api_routes;

use crate::state::AppState;
use axum::Router;
use std::path::Path;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Full application: operational routes, `/api`, and static assets as the fallback.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state))
        .fallback_service(ServeDir::new(static_dir))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
}
