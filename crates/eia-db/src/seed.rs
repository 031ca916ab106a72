use eia_core::CatalogProduct;
use sqlx::PgPool;

use crate::DbError;

/// Outcome of [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub products_inserted: usize,
    pub analyses_inserted: usize,
    /// `true` when the table already held products and nothing was written.
    pub skipped: bool,
}

/// Loads the sample catalog into an empty `products` table.
///
/// Sample analyses are stored against the product they belong to, using the
/// product description as the analysed text. All inserts run inside a single
/// transaction; if any fails the batch is rolled back. A non-empty table is
/// left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, catalog: &[CatalogProduct]) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;

    // Serialize concurrent seeders so the emptiness check stays valid until commit.
    sqlx::query("LOCK TABLE products IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "products table is not empty; skipping seed");
        tx.rollback().await?;
        return Ok(SeedSummary {
            skipped: true,
            ..SeedSummary::default()
        });
    }

    let mut summary = SeedSummary::default();

    for entry in catalog {
        let product = &entry.product;
        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO products \
                 (name, description, category, materials, manufacturing_location, additional_details, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.materials)
        .bind(&product.manufacturing_location)
        .bind(&product.additional_details)
        .bind(&product.image_url)
        .fetch_one(&mut *tx)
        .await?;
        summary.products_inserted += 1;

        if let Some(sample) = &entry.sample_analysis {
            sqlx::query(
                "INSERT INTO analyses \
                     (product_id, product_description, carbon_score, water_score, resources_score, \
                      overall_score, explanation, suggestions, raw_analysis) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(product_id)
            .bind(&product.description)
            .bind(i16::from(sample.scores.carbon))
            .bind(i16::from(sample.scores.water))
            .bind(i16::from(sample.scores.resources))
            .bind(i16::from(sample.scores.overall))
            .bind(&sample.explanation)
            .bind(&sample.suggestions)
            .bind(&sample.raw_analysis)
            .execute(&mut *tx)
            .await?;
            summary.analyses_inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(
        products = summary.products_inserted,
        analyses = summary.analyses_inserted,
        "sample catalog seeded"
    );
    Ok(summary)
}
