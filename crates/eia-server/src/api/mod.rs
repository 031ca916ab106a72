mod analysis;
mod products;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use eia_analysis::Interpreter;
use eia_core::ValidationErrors;
use eia_llm::{ChatClient, LlmError};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, RateLimitState, RequestId, REQUEST_ID_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no API key is configured.
    pub llm: Option<Arc<ChatClient>>,
    pub interpreter: Arc<dyn Interpreter>,
    pub recent_analysis_hours: u32,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
}

/// One page of a paginated listing.
#[derive(Debug, Serialize)]
pub(super) struct Page<T: Serialize> {
    items: Vec<T>,
    total: i64,
    page: i64,
    pages: i64,
}

impl<T: Serialize> Page<T> {
    pub(super) fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            items,
            total,
            page,
            pages: page_count(total, limit),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    llm: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// A `validation_error` carrying the per-field messages.
    pub fn validation(request_id: impl Into<String>, errors: ValidationErrors) -> Self {
        let mut err = Self::new(request_id, "validation_error", "Validation failed");
        err.error.details = Some(errors);
        err
    }

    pub fn not_found(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "not_found", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

pub(super) fn normalize_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

pub(super) fn map_db_error(request_id: String, error: &eia_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_llm_error(request_id: String, error: &LlmError) -> ApiError {
    tracing::error!(error = %error, "analysis service request failed");
    ApiError::new(
        request_id,
        "upstream_error",
        "Failed to get a response from the analysis service",
    )
}

/// Parses a public id from a path segment, reporting a `bad_request` otherwise.
pub(super) fn parse_id(request_id: &str, raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::new(request_id, "bad_request", format!("invalid {what} id '{raw}'")))
}

/// Allows `origin` only, or any origin when unset.
///
/// # Errors
///
/// Returns an error if `origin` is not a valid header value.
pub fn build_cors(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]))
}

fn api_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/search/{query}",
            get(products::search_products),
        )
        .route(
            "/api/v1/products/category/{category}",
            get(products::list_products_by_category),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route(
            "/api/v1/analysis/analyze-text",
            post(analysis::analyze_text),
        )
        .route(
            "/api/v1/analysis/analyze-product/{id}",
            post(analysis::analyze_product),
        )
        .route("/api/v1/analysis/history", get(analysis::list_history))
        .route("/api/v1/analysis/compare", post(analysis::compare_products))
        .route(
            "/api/v1/analysis/product/{id}",
            get(analysis::get_product_analysis),
        )
        .route("/api/v1/analysis/{id}", get(analysis::get_analysis))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, cors: CorsLayer, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/api/v1", get(endpoint_index))
        .route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RootData {
    name: &'static str,
    version: &'static str,
    status: &'static str,
}

async fn root(Extension(req_id): Extension<RequestId>) -> Json<ApiResponse<RootData>> {
    ApiResponse::new(
        RootData {
            name: "Environmental Impact Analyzer API",
            version: env!("CARGO_PKG_VERSION"),
            status: "running",
        },
        req_id.0,
    )
}

#[derive(Debug, Serialize)]
struct EndpointInfo {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

const ENDPOINTS: &[EndpointInfo] = &[
    EndpointInfo { method: "GET", path: "/api/v1/health", description: "Service health" },
    EndpointInfo { method: "GET", path: "/api/v1/products", description: "List products" },
    EndpointInfo { method: "POST", path: "/api/v1/products", description: "Create a product" },
    EndpointInfo { method: "GET", path: "/api/v1/products/{id}", description: "Get a product" },
    EndpointInfo { method: "PUT", path: "/api/v1/products/{id}", description: "Update a product" },
    EndpointInfo { method: "DELETE", path: "/api/v1/products/{id}", description: "Delete a product" },
    EndpointInfo { method: "GET", path: "/api/v1/products/search/{query}", description: "Search products" },
    EndpointInfo { method: "GET", path: "/api/v1/products/category/{category}", description: "Products in a category" },
    EndpointInfo { method: "POST", path: "/api/v1/analysis/analyze-text", description: "Analyze a free-text description" },
    EndpointInfo { method: "POST", path: "/api/v1/analysis/analyze-product/{id}", description: "Analyze a catalog product" },
    EndpointInfo { method: "GET", path: "/api/v1/analysis/history", description: "Analysis history" },
    EndpointInfo { method: "GET", path: "/api/v1/analysis/{id}", description: "Get an analysis" },
    EndpointInfo { method: "GET", path: "/api/v1/analysis/product/{id}", description: "Latest analysis of a product" },
    EndpointInfo { method: "POST", path: "/api/v1/analysis/compare", description: "Compare analyzed products" },
];

async fn endpoint_index(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<&'static [EndpointInfo]>> {
    ApiResponse::new(ENDPOINTS, req_id.0)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let llm = if state.llm.is_some() {
        "configured"
    } else {
        "unconfigured"
    };

    match eia_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    llm,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        llm,
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
