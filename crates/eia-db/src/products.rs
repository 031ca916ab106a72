//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use eia_core::{NewProduct, Product, ProductUpdate, SortField, SortOrder};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{page_offset, DbError};

/// Category filter value that means "every category".
pub const ALL_CATEGORIES: &str = "All Categories";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub materials: Vec<String>,
    pub manufacturing_location: String,
    pub additional_details: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.public_id,
            name: row.name,
            description: row.description,
            category: row.category,
            materials: row.materials,
            manufacturing_location: row.manufacturing_location,
            additional_details: row.additional_details,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input filters for the paginated product listing.
#[derive(Debug, Clone)]
pub struct ProductListFilters<'a> {
    /// `None` or [`ALL_CATEGORIES`] disables the filter.
    pub category: Option<&'a str>,
    /// Case-insensitive substring match over name and description.
    pub search: Option<&'a str>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: i64,
    pub limit: i64,
}

impl Default for ProductListFilters<'_> {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: 10,
        }
    }
}

impl<'a> ProductListFilters<'a> {
    fn category_filter(&self) -> Option<&'a str> {
        self.category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }
}

/// Wraps `term` in `%...%` for `ILIKE`, escaping LIKE metacharacters.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns one page of products plus the total number of matching rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductListFilters<'_>,
) -> Result<(Vec<ProductRow>, i64), DbError> {
    let category = filters.category_filter();
    let search = filters.search_pattern();

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products \
         WHERE ($1::TEXT IS NULL OR category = $1) \
           AND ($2::TEXT IS NULL OR name ILIKE $2 OR description ILIKE $2)",
    )
    .bind(category)
    .bind(search.as_deref())
    .fetch_one(pool)
    .await?;

    // Only the fixed strings from SortField/SortOrder are interpolated.
    let sql = format!(
        "SELECT id, public_id, name, description, category, materials, manufacturing_location, \
                additional_details, image_url, created_at, updated_at \
         FROM products \
         WHERE ($1::TEXT IS NULL OR category = $1) \
           AND ($2::TEXT IS NULL OR name ILIKE $2 OR description ILIKE $2) \
         ORDER BY {} {}, id {} \
         LIMIT $3 OFFSET $4",
        filters.sort_by.column(),
        filters.sort_order.keyword(),
        filters.sort_order.keyword(),
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(category)
        .bind(search.as_deref())
        .bind(filters.limit)
        .bind(page_offset(filters.page, filters.limit))
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Returns a single product by public UUID, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, public_id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, name, description, category, materials, manufacturing_location, \
                additional_details, image_url, created_at, updated_at \
         FROM products \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a product and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products \
             (name, description, category, materials, manufacturing_location, additional_details, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, public_id, name, description, category, materials, manufacturing_location, \
                   additional_details, image_url, created_at, updated_at",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.category)
    .bind(&product.materials)
    .bind(&product.manufacturing_location)
    .bind(&product.additional_details)
    .bind(&product.image_url)
    .fetch_one(pool)
    .await?;

    tracing::info!(product_id = %row.public_id, name = %row.name, "product created");
    Ok(row)
}

/// Applies a sparse update. Fields left `None` keep their stored value.
///
/// Returns `None` if no product has this public UUID.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    public_id: Uuid,
    update: &ProductUpdate,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products SET \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             category = COALESCE($4, category), \
             materials = COALESCE($5, materials), \
             manufacturing_location = COALESCE($6, manufacturing_location), \
             additional_details = COALESCE($7, additional_details), \
             image_url = COALESCE($8, image_url), \
             updated_at = NOW() \
         WHERE public_id = $1 \
         RETURNING id, public_id, name, description, category, materials, manufacturing_location, \
                   additional_details, image_url, created_at, updated_at",
    )
    .bind(public_id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(&update.category)
    .bind(&update.materials)
    .bind(&update.manufacturing_location)
    .bind(&update.additional_details)
    .bind(&update.image_url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes a product. Its analyses are kept with `product_id` cleared.
///
/// Returns `true` if a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, public_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(product_id = %public_id, "product deleted");
    }
    Ok(deleted)
}

/// Case-insensitive search over name, description and category, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_products(
    pool: &PgPool,
    query: &str,
    limit: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let pattern = like_pattern(query.trim());
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, name, description, category, materials, manufacturing_location, \
                additional_details, image_url, created_at, updated_at \
         FROM products \
         WHERE name ILIKE $1 OR description ILIKE $1 OR category ILIKE $1 \
         ORDER BY name, id \
         LIMIT $2",
    )
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every product in `category` (case-insensitive), newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_category(
    pool: &PgPool,
    category: &str,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, name, description, category, materials, manufacturing_location, \
                additional_details, image_url, created_at, updated_at \
         FROM products \
         WHERE LOWER(category) = LOWER($1) \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(category.trim())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
