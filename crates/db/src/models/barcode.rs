//! Barcode rows.

use sqlx::FromRow;
use stockroom_core::barcode::Barcode;
use stockroom_core::store::StoreError;
use stockroom_core::types::{DbId, Timestamp};

use super::parse_column;

/// A row from the `barcodes` table.
#[derive(Debug, Clone, FromRow)]
pub struct BarcodeRow {
    pub code: String,
    pub format: String,
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl TryFrom<BarcodeRow> for Barcode {
    type Error = StoreError;

    fn try_from(row: BarcodeRow) -> Result<Self, Self::Error> {
        Ok(Barcode {
            format: parse_column(&row.format)?,
            code: row.code,
            product_id: row.product_id,
            variant_id: row.variant_id,
            created_at: row.created_at,
        })
    }
}
