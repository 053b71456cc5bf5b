//! Comment API handlers

use crate::api::{AppState, json_body};
use crate::core::comment;
use crate::errors::Result;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;

/// Body for posting a comment
#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(rename = "productID")]
    product_id: i64,
    #[serde(rename = "userID")]
    user_id: i64,
    content: String,
}

/// Comment routes
pub fn router() -> Router<AppState> {
    Router::new().route("/api/comment", post(create))
}

/// POST /api/comment
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CommentBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let created =
        comment::create_comment(&state.db, body.product_id, body.user_id, body.content).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
