//! Repository for `product_variants` and `variant_combinations`.

use sqlx::PgConnection;
use stockroom_core::types::DbId;
use stockroom_core::variant::{ProductVariant, VariantCombination};

use crate::models::variant::{ProductVariantRow, VariantOptionValueRow};

const COLUMNS: &str =
    "id, product_id, sku, price, cost, stock_level, is_active, created_at, updated_at";

pub struct VariantRepo;

impl VariantRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ProductVariantRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM product_variants WHERE id = $1");
        sqlx::query_as::<_, ProductVariantRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_sku(
        conn: &mut PgConnection,
        sku: &str,
    ) -> Result<Option<ProductVariantRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM product_variants WHERE sku = $1");
        sqlx::query_as::<_, ProductVariantRow>(&query)
            .bind(sku)
            .fetch_optional(conn)
            .await
    }

    pub async fn list_by_product(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<Vec<ProductVariantRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY sku ASC"
        );
        sqlx::query_as::<_, ProductVariantRow>(&query)
            .bind(product_id)
            .fetch_all(conn)
            .await
    }

    pub async fn upsert(
        conn: &mut PgConnection,
        variant: &ProductVariant,
    ) -> Result<ProductVariantRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_variants
                (id, product_id, sku, price, cost, stock_level, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                sku = EXCLUDED.sku,
                price = EXCLUDED.price,
                cost = EXCLUDED.cost,
                stock_level = EXCLUDED.stock_level,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariantRow>(&query)
            .bind(variant.id)
            .bind(variant.product_id)
            .bind(&variant.sku)
            .bind(variant.price)
            .bind(variant.cost)
            .bind(variant.stock_level)
            .bind(variant.is_active)
            .bind(variant.created_at)
            .bind(variant.updated_at)
            .fetch_one(conn)
            .await
    }

    pub async fn insert_combination(
        conn: &mut PgConnection,
        combination: &VariantCombination,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO variant_combinations (id, variant_id, option_value_id)
             VALUES ($1, $2, $3)",
        )
        .bind(combination.id)
        .bind(combination.variant_id)
        .bind(combination.option_value_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Option values a variant represents, ordered by option position.
    pub async fn values_for_variant(
        conn: &mut PgConnection,
        variant_id: DbId,
    ) -> Result<Vec<VariantOptionValueRow>, sqlx::Error> {
        sqlx::query_as::<_, VariantOptionValueRow>(
            "SELECT v.id, v.option_id, v.value, v.display_value, v.position,
                    v.price_adjustment_type, v.price_adjustment_value
             FROM variant_combinations c
             JOIN variant_option_values v ON v.id = c.option_value_id
             JOIN variant_options o ON o.id = v.option_id
             WHERE c.variant_id = $1
             ORDER BY o.position ASC, o.name ASC",
        )
        .bind(variant_id)
        .fetch_all(conn)
        .await
    }
}
