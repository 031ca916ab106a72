//! Analysis endpoints: run the LLM, interpret its text, persist, compare.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use eia_analysis::{
    comparison_prompt, describe_product, summarize, ComparisonSummary, ANALYSIS_SYSTEM_PROMPT,
    COMPARISON_SYSTEM_PROMPT,
};
use eia_core::{
    validation::{validate_analysis_text, validate_comparison_ids},
    Analysis, AnalysisScores, Product, ValidationErrors,
};
use eia_db::{AnalysisRow, NewAnalysis};
use eia_llm::ChatClient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_llm_error, normalize_limit, normalize_page, parse_id, ApiError,
    ApiResponse, AppState, Page,
};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeTextRequest {
    #[serde(default)]
    pub product_text: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeProductQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompareRequest {
    #[serde(default)]
    pub product_ids: Vec<String>,
    #[serde(default)]
    pub include_narrative: bool,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct AnalysisResult {
    #[serde(flatten)]
    analysis: Analysis,
    /// `true` when a recent stored analysis was returned instead of a new one.
    reused: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ComparedProduct {
    id: Option<Uuid>,
    name: Option<String>,
    scores: AnalysisScores,
    explanation: String,
    analyzed_at: DateTime<Utc>,
}

impl From<&Analysis> for ComparedProduct {
    fn from(analysis: &Analysis) -> Self {
        Self {
            id: analysis.product.as_ref().map(|p| p.id),
            name: analysis.product.as_ref().map(|p| p.name.clone()),
            scores: analysis.scores,
            explanation: analysis.explanation.clone(),
            analyzed_at: analysis.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ComparisonData {
    products: Vec<ComparedProduct>,
    summary: ComparisonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    narrative: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_llm(state: &AppState, rid: &str) -> Result<Arc<ChatClient>, ApiError> {
    state.llm.clone().ok_or_else(|| {
        tracing::warn!("analysis requested but no LLM API key is configured");
        ApiError::new(
            rid,
            "upstream_error",
            "The analysis service is not configured",
        )
    })
}

fn to_analysis(rid: &str, row: AnalysisRow) -> Result<Analysis, ApiError> {
    Analysis::try_from(row).map_err(|e| map_db_error(rid.to_owned(), &e))
}

/// Asks the LLM for an assessment of `user_text`, interprets it and stores the result.
async fn run_analysis(
    state: &AppState,
    rid: &str,
    product_id: Option<i64>,
    product_description: &str,
    user_text: &str,
) -> Result<Analysis, ApiError> {
    let llm = require_llm(state, rid)?;

    let raw = llm
        .complete(ANALYSIS_SYSTEM_PROMPT, user_text)
        .await
        .map_err(|e| map_llm_error(rid.to_owned(), &e))?
        .unwrap_or_default();
    let fragment = state.interpreter.interpret(&raw);

    let row = eia_db::create_analysis(
        &state.pool,
        NewAnalysis {
            product_id,
            product_description,
            fragment: &fragment,
            raw_analysis: &raw,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.to_owned(), &e))?;

    to_analysis(rid, row)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/analyze-text
pub(super) async fn analyze_text(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeTextRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AnalysisResult>>), ApiError> {
    let rid = &req_id.0;
    validate_analysis_text(&body.product_text).map_err(|e| ApiError::validation(rid, e))?;

    let text = body.product_text.trim();
    let analysis = run_analysis(&state, rid, None, text, text).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(
            AnalysisResult {
                analysis,
                reused: false,
            },
            req_id.0,
        ),
    ))
}

/// POST /api/v1/analysis/analyze-product/{id}?force=bool
pub(super) async fn analyze_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Query(query): Query<AnalyzeProductQuery>,
) -> Result<(StatusCode, Json<ApiResponse<AnalysisResult>>), ApiError> {
    let rid = &req_id.0;
    let public_id = parse_id(rid, &id, "product")?;

    let row = eia_db::get_product(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "Product not found"))?;
    let product_id = row.id;

    if !query.force {
        let recent = eia_db::get_recent_product_analysis(
            &state.pool,
            product_id,
            state.recent_analysis_hours,
        )
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

        if let Some(recent) = recent {
            tracing::info!(
                product_id = %public_id,
                analysis_id = %recent.public_id,
                "reusing recent analysis"
            );
            let analysis = to_analysis(rid, recent)?;
            return Ok((
                StatusCode::OK,
                ApiResponse::new(
                    AnalysisResult {
                        analysis,
                        reused: true,
                    },
                    req_id.0,
                ),
            ));
        }
    }

    let product = Product::from(row);
    let prompt = describe_product(&product);
    let analysis = run_analysis(
        &state,
        rid,
        Some(product_id),
        &product.description,
        &prompt,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new(
            AnalysisResult {
                analysis,
                reused: false,
            },
            req_id.0,
        ),
    ))
}

/// GET /api/v1/analysis/history
pub(super) async fn list_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Page<Analysis>>>, ApiError> {
    let rid = &req_id.0;
    let page = normalize_page(query.page);
    let limit = normalize_limit(query.limit);

    let (rows, total) = eia_db::list_analysis_history(&state.pool, page, limit)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let items = rows
        .into_iter()
        .map(|row| to_analysis(rid, row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApiResponse::new(
        Page::new(items, total, page, limit),
        req_id.0,
    ))
}

/// GET /api/v1/analysis/{id}
pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Analysis>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_id(rid, &id, "analysis")?;

    let row = eia_db::get_analysis(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "Analysis not found"))?;

    Ok(ApiResponse::new(to_analysis(rid, row)?, req_id.0))
}

/// GET /api/v1/analysis/product/{id}: the product's newest analysis.
pub(super) async fn get_product_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Analysis>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_id(rid, &id, "product")?;

    let product = eia_db::get_product(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "Product not found"))?;

    let row = eia_db::get_latest_product_analysis(&state.pool, product.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::not_found(rid, "This product has not been analyzed yet"))?;

    Ok(ApiResponse::new(to_analysis(rid, row)?, req_id.0))
}

fn parse_comparison_ids(rid: &str, raw: &[String]) -> Result<Vec<Uuid>, ApiError> {
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => ids.push(id),
            Err(_) => {
                let mut errors = ValidationErrors::default();
                errors.add("product_ids", format!("'{value}' is not a valid product id"));
                return Err(ApiError::validation(rid, errors));
            }
        }
    }
    validate_comparison_ids(&ids).map_err(|e| ApiError::validation(rid, e))?;
    Ok(ids)
}

/// POST /api/v1/analysis/compare
pub(super) async fn compare_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CompareRequest>,
) -> Result<Json<ApiResponse<ComparisonData>>, ApiError> {
    let rid = &req_id.0;
    let ids = parse_comparison_ids(rid, &body.product_ids)?;

    let rows = eia_db::get_latest_analyses_for_products(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if rows.len() != ids.len() {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !rows.iter().any(|r| r.product_public_id == Some(**id)))
            .map(ToString::to_string)
            .collect();
        tracing::debug!(?missing, "comparison requested for unanalyzed products");
        return Err(ApiError::not_found(
            rid,
            format!(
                "One or more products have not been analyzed yet: {}",
                missing.join(", ")
            ),
        ));
    }

    let analyses = rows
        .into_iter()
        .map(|row| to_analysis(rid, row))
        .collect::<Result<Vec<_>, _>>()?;
    let summary = summarize(&analyses)
        .ok_or_else(|| ApiError::new(rid, "internal_error", "nothing to compare"))?;

    let narrative = if body.include_narrative {
        let llm = require_llm(&state, rid)?;
        llm.complete(COMPARISON_SYSTEM_PROMPT, &comparison_prompt(&analyses))
            .await
            .map_err(|e| map_llm_error(rid.clone(), &e))?
    } else {
        None
    };

    Ok(ApiResponse::new(
        ComparisonData {
            products: analyses.iter().map(ComparedProduct::from).collect(),
            summary,
            narrative,
        },
        req_id.0,
    ))
}
