//! Shared-secret login check. No token or session is issued.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<Value>, AppError> {
    // Plain comparison: a single low-value shared secret, no per-user credentials.
    if body.password.as_str() != &*state.admin_password {
        tracing::warn!("login rejected");
        return Err(AppError::Unauthorized);
    }
    Ok(Json(json!({ "success": true })))
}
