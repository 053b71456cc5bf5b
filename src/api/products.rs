//! Product API handlers

use crate::api::{AppState, json_body, path_param};
use crate::core::product::{self, NewProduct, Page, ProductChanges, StockChange};
use crate::errors::Result;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;

/// Product routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/product", get(list).post(create))
        .route("/api/product/name", get(find_by_name))
        .route("/api/product/update/quantity", put(update_stock))
        .route(
            "/api/product/{product_id}",
            get(get_by_id).put(update).delete(delete),
        )
}

/// GET /api/product - All products, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse> {
    let products = product::list_products(&state.db, page).await?;
    Ok(Json(products))
}

/// Query string for name search
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    name: Option<String>,
}

/// GET /api/product/name?name= - Substring search on product names
pub async fn find_by_name(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<impl IntoResponse> {
    let pattern = query.name.unwrap_or_default();
    let products = product::find_products_by_name(&state.db, &pattern).await?;
    Ok(Json(products))
}

/// GET /api/product/{product_id} - Product with all relations
pub async fn get_by_id(
    State(state): State<AppState>,
    product_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let product_id = path_param(product_id)?;
    let detail = product::get_product_by_id(&state.db, product_id).await?;
    Ok(Json(detail))
}

/// POST /api/product - Create a product
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let input = json_body(payload)?;
    let created = product::create_product(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/product/{product_id} - Update fields and optionally replace tags
pub async fn update(
    State(state): State<AppState>,
    product_id: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<ProductChanges>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let product_id = path_param(product_id)?;
    let changes = json_body(payload)?;
    let updated = product::update_product(&state.db, product_id, changes).await?;
    Ok(Json(updated))
}

/// PUT /api/product/update/quantity - Apply a checkout's stock changes
pub async fn update_stock(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<StockChange>>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let changes = json_body(payload)?;
    let updated = product::update_stock(&state.db, &changes).await?;
    Ok(Json(updated))
}

/// DELETE /api/product/{product_id} - Remove a product and its tag links
pub async fn delete(
    State(state): State<AppState>,
    product_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let product_id = path_param(product_id)?;
    product::delete_product(&state.db, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
