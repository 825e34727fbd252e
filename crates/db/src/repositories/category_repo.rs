//! Repository for the `categories` table.

use sqlx::PgConnection;
use stockroom_core::category::Category;
use stockroom_core::types::DbId;

use crate::models::category::{CategoryRow, CategoryStatisticsRow};

/// Column list shared across queries. `product_count` is derived.
const COLUMNS: &str = "id, name, slug, description, icon, color, image, is_active, position, \
     (SELECT COUNT(*) FROM products p WHERE p.category_id = categories.id) AS product_count, \
     parent_id, created_at, updated_at";

const ORDER: &str = "ORDER BY position ASC, name ASC";

pub struct CategoryRepo;

impl CategoryRepo {
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Bulk fetch. Ids without a row are simply absent.
    pub async fn find_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = ANY($1) {ORDER}");
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    pub async fn list(conn: &mut PgConnection) -> Result<Vec<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories {ORDER}");
        sqlx::query_as::<_, CategoryRow>(&query)
            .fetch_all(conn)
            .await
    }

    pub async fn list_children(
        conn: &mut PgConnection,
        parent_id: DbId,
    ) -> Result<Vec<CategoryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE parent_id = $1 {ORDER}");
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(parent_id)
            .fetch_all(conn)
            .await
    }

    pub async fn exists(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
    }

    /// Whether `slug` belongs to a category other than `excluding`.
    pub async fn slug_taken(
        conn: &mut PgConnection,
        slug: &str,
        excluding: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2)
             )",
        )
        .bind(slug)
        .bind(excluding)
        .fetch_one(conn)
        .await
    }

    /// Insert the category, or overwrite every stored field if the id exists.
    pub async fn upsert(
        conn: &mut PgConnection,
        category: &Category,
    ) -> Result<CategoryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories
                (id, name, slug, description, icon, color, image, is_active, position,
                 parent_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                description = EXCLUDED.description,
                icon = EXCLUDED.icon,
                color = EXCLUDED.color,
                image = EXCLUDED.image,
                is_active = EXCLUDED.is_active,
                position = EXCLUDED.position,
                parent_id = EXCLUDED.parent_id,
                updated_at = EXCLUDED.updated_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CategoryRow>(&query)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(&category.description)
            .bind(&category.icon)
            .bind(&category.color)
            .bind(&category.image)
            .bind(category.is_active)
            .bind(category.position)
            .bind(category.parent_id)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(conn)
            .await
    }

    /// Delete the given rows. Returns the number removed.
    pub async fn delete_many(conn: &mut PgConnection, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ANY($1)")
            .bind(ids)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn statistics(conn: &mut PgConnection) -> Result<CategoryStatisticsRow, sqlx::Error> {
        sqlx::query_as::<_, CategoryStatisticsRow>(
            "SELECT
                COUNT(*) AS total_categories,
                COUNT(*) FILTER (WHERE is_active) AS active_categories,
                COUNT(*) FILTER (WHERE parent_id IS NULL) AS root_categories
             FROM categories",
        )
        .fetch_one(conn)
        .await
    }
}
