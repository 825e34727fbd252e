//! Product rows.

use sqlx::FromRow;
use stockroom_core::product::Product;
use stockroom_core::store::StoreError;
use stockroom_core::types::{DbId, Money, Timestamp};

use super::parse_column;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub unit: Option<String>,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub tax_rate: Option<Money>,
    pub stock_level: i32,
    pub reorder_level: i32,
    /// `active` or `inactive`.
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            status: parse_column(&row.status)?,
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            sku: row.sku,
            description: row.description,
            image: row.image,
            unit: row.unit,
            price: row.price,
            cost_price: row.cost_price,
            tax_rate: row.tax_rate,
            stock_level: row.stock_level,
            reorder_level: row.reorder_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
