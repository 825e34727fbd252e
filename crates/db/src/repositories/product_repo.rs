//! Repository for the `products` table.

use sqlx::PgConnection;
use stockroom_core::product::Product;
use stockroom_core::types::DbId;

use crate::models::product::ProductRow;

const COLUMNS: &str = "id, category_id, name, sku, description, image, unit, price, cost_price, \
     tax_rate, stock_level, reorder_level, status, created_at, updated_at";

pub struct ProductRepo;

impl ProductRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Newest first.
    pub async fn list(
        conn: &mut PgConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await
    }

    pub async fn count(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(conn)
            .await
    }

    /// Case-insensitive substring match on name or sku.
    pub async fn search(conn: &mut PgConnection, term: &str) -> Result<Vec<ProductRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE name ILIKE '%' || $1 || '%' OR sku ILIKE '%' || $1 || '%'
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(escape_like(term))
            .fetch_all(conn)
            .await
    }

    /// Products in the category or in one of its direct children.
    pub async fn list_by_category_or_parent(
        conn: &mut PgConnection,
        category_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE category_id = $1
                OR category_id IN (SELECT id FROM categories WHERE parent_id = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(category_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(conn)
            .await
    }

    pub async fn sku_taken(
        conn: &mut PgConnection,
        sku: &str,
        excluding: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM products
                WHERE sku = $1 AND ($2::uuid IS NULL OR id <> $2)
             )",
        )
        .bind(sku)
        .bind(excluding)
        .fetch_one(conn)
        .await
    }

    pub async fn count_in_categories(
        conn: &mut PgConnection,
        category_ids: &[DbId],
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ANY($1)")
            .bind(category_ids)
            .fetch_one(conn)
            .await
    }

    pub async fn upsert(conn: &mut PgConnection, product: &Product) -> Result<ProductRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO products
                (id, category_id, name, sku, description, image, unit, price, cost_price,
                 tax_rate, stock_level, reorder_level, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (id) DO UPDATE SET
                category_id = EXCLUDED.category_id,
                name = EXCLUDED.name,
                sku = EXCLUDED.sku,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                unit = EXCLUDED.unit,
                price = EXCLUDED.price,
                cost_price = EXCLUDED.cost_price,
                tax_rate = EXCLUDED.tax_rate,
                stock_level = EXCLUDED.stock_level,
                reorder_level = EXCLUDED.reorder_level,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(product.id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.sku)
            .bind(&product.description)
            .bind(&product.image)
            .bind(&product.unit)
            .bind(product.price)
            .bind(product.cost_price)
            .bind(product.tax_rate)
            .bind(product.stock_level)
            .bind(product.reorder_level)
            .bind(product.status.as_str())
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(conn)
            .await
    }

    /// Delete a product. Variants, their combinations, and barcodes follow
    /// through `ON DELETE CASCADE`.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape `%`, `_`, and `\` so user input matches literally inside ILIKE.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
