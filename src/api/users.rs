//! User API handlers

use crate::api::{AppState, json_body};
use crate::core::user;
use crate::errors::Result;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;

/// Body for registering a commenter
#[derive(Debug, Deserialize)]
pub struct UserBody {
    username: String,
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new().route("/api/user", post(create))
}

/// POST /api/user
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UserBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let created = user::create_user(&state.db, body.username).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
