use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use eia_core::{
    validation::{validate_new_product, validate_product_update},
    NewProduct, Product, ProductUpdate, SortField, SortOrder,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_page, parse_id, ApiError, ApiResponse, AppState,
    Page,
};

#[derive(Debug, Deserialize)]
pub(super) struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedData {
    deleted: bool,
}

fn into_products(rows: Vec<eia_db::ProductRow>) -> Vec<Product> {
    rows.into_iter().map(Product::from).collect()
}

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<Page<Product>>>, ApiError> {
    let page = normalize_page(query.page);
    let limit = normalize_limit(query.limit);

    let (rows, total) = eia_db::list_products(
        &state.pool,
        &eia_db::ProductListFilters {
            category: query.category.as_deref(),
            search: query.search.as_deref(),
            sort_by: query.sort_by.unwrap_or_default(),
            sort_order: query.sort_order.unwrap_or_default(),
            page,
            limit,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(
        Page::new(into_products(rows), total, page, limit),
        req_id.0,
    ))
}

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let product = body.normalized();
    validate_new_product(&product).map_err(|errors| ApiError::validation(&req_id.0, errors))?;

    let row = eia_db::create_product(&state.pool, &product)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(Product::from(row), req_id.0),
    ))
}

/// GET /api/v1/products/{id}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_id(rid, &id, "product")?;

    let row = eia_db::get_product(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "Product not found"))?;

    Ok(ApiResponse::new(Product::from(row), req_id.0))
}

/// PUT /api/v1/products/{id}: sparse update, omitted fields keep their value.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<ProductUpdate>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_id(rid, &id, "product")?;
    let update = body.normalized();
    validate_product_update(&update).map_err(|errors| ApiError::validation(rid, errors))?;

    let row = if update.is_empty() {
        eia_db::get_product(&state.pool, public_id).await
    } else {
        eia_db::update_product(&state.pool, public_id, &update).await
    }
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::not_found(rid, "Product not found"))?;

    Ok(ApiResponse::new(Product::from(row), req_id.0))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedData>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_id(rid, &id, "product")?;

    let deleted = eia_db::delete_product(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::not_found(rid, "Product not found"));
    }

    Ok(ApiResponse::new(DeletedData { deleted }, req_id.0))
}

/// GET /api/v1/products/search/{query}
pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(term): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let rid = &req_id.0;
    if term.trim().is_empty() {
        return Err(ApiError::new(rid, "bad_request", "search query must not be empty"));
    }

    let rows = eia_db::search_products(&state.pool, &term, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(ApiResponse::new(into_products(rows), req_id.0))
}

/// GET /api/v1/products/category/{category}
pub(super) async fn list_products_by_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let rows = eia_db::list_products_by_category(&state.pool, &category)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(into_products(rows), req_id.0))
}
