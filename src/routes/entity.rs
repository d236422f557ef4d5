//! API routes under `/api`. Entity paths are parameterized; handlers resolve the entity from the segment.
//! Static segments (`dashboard`, `login`) take priority over `/:path_segment`.

use crate::handlers::auth::login;
use crate::handlers::dashboard::dashboard;
use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/login", post(login))
        .route("/:path_segment", get(list).post(create))
        .route(
            "/:path_segment/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
