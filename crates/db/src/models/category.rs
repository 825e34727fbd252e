//! Category rows.

use sqlx::FromRow;
use stockroom_core::category::{Category, CategoryStatistics};
use stockroom_core::types::{DbId, Timestamp};

/// A row from the `categories` table, with `product_count` joined in.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub position: i32,
    pub product_count: i64,
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            icon: row.icon,
            color: row.color,
            image: row.image,
            is_active: row.is_active,
            position: row.position,
            product_count: row.product_count,
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Result of the statistics aggregate.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct CategoryStatisticsRow {
    pub total_categories: i64,
    pub active_categories: i64,
    pub root_categories: i64,
}

impl From<CategoryStatisticsRow> for CategoryStatistics {
    fn from(row: CategoryStatisticsRow) -> Self {
        CategoryStatistics {
            total_categories: row.total_categories,
            active_categories: row.active_categories,
            inactive_categories: row.total_categories - row.active_categories,
            root_categories: row.root_categories,
        }
    }
}
