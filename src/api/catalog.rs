//! Reference data API handlers - categories, subcategories, origins, tags

use crate::api::{AppState, json_body};
use crate::core::catalog;
use crate::errors::Result;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

/// Body for endpoints that only need a name
#[derive(Debug, Deserialize)]
pub struct NameBody {
    name: String,
}

/// Body for creating a subcategory
#[derive(Debug, Deserialize)]
pub struct SubCategoryBody {
    name: String,
    #[serde(default, rename = "categoryID")]
    category_id: Option<i64>,
}

/// Reference data routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/category", get(list_categories).post(create_category))
        .route("/api/category/reconcile", post(reconcile_counts))
        .route(
            "/api/subcategory",
            get(list_subcategories).post(create_subcategory),
        )
        .route("/api/origin", get(list_origins).post(create_origin))
        .route("/api/tag", get(list_tags).post(create_tag))
}

/// GET /api/category
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

/// POST /api/category
pub async fn create_category(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NameBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let created = catalog::create_category(&state.db, body.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/category/reconcile - Recompute counts, returning what changed
pub async fn reconcile_counts(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog::reconcile_category_counts(&state.db).await?))
}

/// GET /api/subcategory
pub async fn list_subcategories(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog::list_subcategories(&state.db).await?))
}

/// POST /api/subcategory
pub async fn create_subcategory(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubCategoryBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let created = catalog::create_subcategory(&state.db, body.name, body.category_id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/origin
pub async fn list_origins(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog::list_origins(&state.db).await?))
}

/// POST /api/origin
pub async fn create_origin(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NameBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let created = catalog::create_origin(&state.db, body.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/tag
pub async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(catalog::list_tags(&state.db).await?))
}

/// POST /api/tag
pub async fn create_tag(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NameBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let created = catalog::create_tag(&state.db, body.name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
