//! Database operations for the `analyses` table.
//!
//! Analyses are append-only. The "current" analysis of a product is simply
//! its newest row.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use eia_core::{Analysis, AnalysisFragment, AnalysisScores, ProductRef, Score};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{page_offset, DbError};

const ANALYSIS_SELECT: &str = "\
    SELECT a.id, a.public_id, a.product_id, p.public_id AS product_public_id, \
           p.name AS product_name, a.product_description, a.carbon_score, a.water_score, \
           a.resources_score, a.overall_score, a.explanation, a.suggestions, \
           a.raw_analysis, a.created_at \
    FROM analyses a \
    LEFT JOIN products p ON p.id = a.product_id";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `analyses`, joined with the owning product's identity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: i64,
    pub public_id: Uuid,
    pub product_id: Option<i64>,
    pub product_public_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub product_description: String,
    pub carbon_score: i16,
    pub water_score: i16,
    pub resources_score: i16,
    pub overall_score: i16,
    pub explanation: String,
    pub suggestions: String,
    pub raw_analysis: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = DbError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let product = match (row.product_public_id, row.product_name) {
            (Some(id), Some(name)) => Some(ProductRef { id, name }),
            _ => None,
        };

        Ok(Analysis {
            id: row.public_id,
            product,
            product_description: row.product_description,
            scores: AnalysisScores {
                carbon: Score::try_from(row.carbon_score)?,
                water: Score::try_from(row.water_score)?,
                resources: Score::try_from(row.resources_score)?,
                overall: Score::try_from(row.overall_score)?,
            },
            explanation: row.explanation,
            suggestions: row.suggestions,
            raw_analysis: row.raw_analysis,
            created_at: row.created_at,
        })
    }
}

/// Input for [`create_analysis`].
#[derive(Debug, Clone, Copy)]
pub struct NewAnalysis<'a> {
    /// Internal `products.id`; `None` for ad-hoc text.
    pub product_id: Option<i64>,
    pub product_description: &'a str,
    pub fragment: &'a AnalysisFragment,
    pub raw_analysis: &'a str,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts an analysis and returns it joined with its product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_analysis(
    pool: &PgPool,
    analysis: NewAnalysis<'_>,
) -> Result<AnalysisRow, DbError> {
    let scores = &analysis.fragment.scores;
    let row = sqlx::query_as::<_, AnalysisRow>(
        "WITH a AS ( \
             INSERT INTO analyses \
                 (product_id, product_description, carbon_score, water_score, resources_score, \
                  overall_score, explanation, suggestions, raw_analysis) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING * \
         ) \
         SELECT a.id, a.public_id, a.product_id, p.public_id AS product_public_id, \
                p.name AS product_name, a.product_description, a.carbon_score, a.water_score, \
                a.resources_score, a.overall_score, a.explanation, a.suggestions, \
                a.raw_analysis, a.created_at \
         FROM a \
         LEFT JOIN products p ON p.id = a.product_id",
    )
    .bind(analysis.product_id)
    .bind(analysis.product_description)
    .bind(i16::from(scores.carbon))
    .bind(i16::from(scores.water))
    .bind(i16::from(scores.resources))
    .bind(i16::from(scores.overall))
    .bind(&analysis.fragment.explanation)
    .bind(&analysis.fragment.suggestions)
    .bind(analysis.raw_analysis)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        analysis_id = %row.public_id,
        product_id = ?row.product_public_id,
        overall = row.overall_score,
        "analysis stored"
    );
    Ok(row)
}

/// Returns a single analysis by public UUID, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis(pool: &PgPool, public_id: Uuid) -> Result<Option<AnalysisRow>, DbError> {
    let sql = format!("{ANALYSIS_SELECT} WHERE a.public_id = $1");
    let row = sqlx::query_as::<_, AnalysisRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns one page of analyses, newest first, plus the total count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_analysis_history(
    pool: &PgPool,
    page: i64,
    limit: i64,
) -> Result<(Vec<AnalysisRow>, i64), DbError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses")
        .fetch_one(pool)
        .await?;

    let sql = format!("{ANALYSIS_SELECT} ORDER BY a.created_at DESC, a.id DESC LIMIT $1 OFFSET $2");
    let rows = sqlx::query_as::<_, AnalysisRow>(&sql)
        .bind(limit)
        .bind(page_offset(page, limit))
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Returns the newest analysis of a product (internal id).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_product_analysis(
    pool: &PgPool,
    product_id: i64,
) -> Result<Option<AnalysisRow>, DbError> {
    let sql = format!(
        "{ANALYSIS_SELECT} WHERE a.product_id = $1 ORDER BY a.created_at DESC, a.id DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, AnalysisRow>(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the newest analysis of a product if it is younger than `max_age_hours`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_recent_product_analysis(
    pool: &PgPool,
    product_id: i64,
    max_age_hours: u32,
) -> Result<Option<AnalysisRow>, DbError> {
    let hours = i32::try_from(max_age_hours).unwrap_or(i32::MAX);
    let sql = format!(
        "{ANALYSIS_SELECT} \
         WHERE a.product_id = $1 AND a.created_at >= NOW() - make_interval(hours => $2) \
         ORDER BY a.created_at DESC, a.id DESC LIMIT 1"
    );
    let row = sqlx::query_as::<_, AnalysisRow>(&sql)
        .bind(product_id)
        .bind(hours)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the newest analysis for each product in `product_public_ids`.
///
/// Results follow the order of `product_public_ids`; products that were
/// never analyzed (or do not exist) are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_analyses_for_products(
    pool: &PgPool,
    product_public_ids: &[Uuid],
) -> Result<Vec<AnalysisRow>, DbError> {
    if product_public_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, AnalysisRow>(
        "SELECT DISTINCT ON (a.product_id) \
                a.id, a.public_id, a.product_id, p.public_id AS product_public_id, \
                p.name AS product_name, a.product_description, a.carbon_score, a.water_score, \
                a.resources_score, a.overall_score, a.explanation, a.suggestions, \
                a.raw_analysis, a.created_at \
         FROM analyses a \
         JOIN products p ON p.id = a.product_id \
         WHERE p.public_id = ANY($1) \
         ORDER BY a.product_id, a.created_at DESC, a.id DESC",
    )
    .bind(product_public_ids)
    .fetch_all(pool)
    .await?;

    Ok(order_by_product(rows, product_public_ids))
}

fn order_by_product(rows: Vec<AnalysisRow>, product_public_ids: &[Uuid]) -> Vec<AnalysisRow> {
    let mut by_product: HashMap<Uuid, AnalysisRow> = rows
        .into_iter()
        .filter_map(|row| row.product_public_id.map(|id| (id, row)))
        .collect();

    product_public_ids
        .iter()
        .filter_map(|id| by_product.remove(id))
        .collect()
}
