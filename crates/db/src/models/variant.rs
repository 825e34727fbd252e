//! Variant, option, option-value, and combination rows.

use sqlx::FromRow;
use stockroom_core::store::StoreError;
use stockroom_core::types::{DbId, Money, Timestamp};
use stockroom_core::variant::{ProductVariant, VariantOption, VariantOptionValue};

use super::parse_column;

/// A row from the `product_variants` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProductVariantRow {
    pub id: DbId,
    pub product_id: DbId,
    pub sku: String,
    pub price: Money,
    pub cost: Option<Money>,
    pub stock_level: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ProductVariantRow> for ProductVariant {
    fn from(row: ProductVariantRow) -> Self {
        ProductVariant {
            id: row.id,
            product_id: row.product_id,
            sku: row.sku,
            price: row.price,
            cost: row.cost,
            stock_level: row.stock_level,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `variant_options` table.
#[derive(Debug, Clone, FromRow)]
pub struct VariantOptionRow {
    pub id: DbId,
    pub name: String,
    pub is_required: bool,
    pub display_type: String,
    pub position: i32,
}

impl TryFrom<VariantOptionRow> for VariantOption {
    type Error = StoreError;

    fn try_from(row: VariantOptionRow) -> Result<Self, Self::Error> {
        Ok(VariantOption {
            display_type: parse_column(&row.display_type)?,
            id: row.id,
            name: row.name,
            is_required: row.is_required,
            position: row.position,
        })
    }
}

/// A row from the `variant_option_values` table.
#[derive(Debug, Clone, FromRow)]
pub struct VariantOptionValueRow {
    pub id: DbId,
    pub option_id: DbId,
    pub value: String,
    pub display_value: Option<String>,
    pub position: i32,
    pub price_adjustment_type: String,
    pub price_adjustment_value: Money,
}

impl TryFrom<VariantOptionValueRow> for VariantOptionValue {
    type Error = StoreError;

    fn try_from(row: VariantOptionValueRow) -> Result<Self, Self::Error> {
        Ok(VariantOptionValue {
            price_adjustment_type: parse_column(&row.price_adjustment_type)?,
            id: row.id,
            option_id: row.option_id,
            value: row.value,
            display_value: row.display_value,
            position: row.position,
            price_adjustment_value: row.price_adjustment_value,
        })
    }
}
