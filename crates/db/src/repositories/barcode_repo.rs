//! Repository for the `barcodes` table.

use sqlx::PgConnection;
use stockroom_core::barcode::Barcode;
use stockroom_core::types::DbId;

use crate::models::barcode::BarcodeRow;

const COLUMNS: &str = "code, format, product_id, variant_id, created_at";

pub struct BarcodeRepo;

impl BarcodeRepo {
    pub async fn find_by_code(
        conn: &mut PgConnection,
        code: &str,
    ) -> Result<Option<BarcodeRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM barcodes WHERE code = $1");
        sqlx::query_as::<_, BarcodeRow>(&query)
            .bind(code)
            .fetch_optional(conn)
            .await
    }

    pub async fn exists(conn: &mut PgConnection, code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM barcodes WHERE code = $1)")
            .bind(code)
            .fetch_one(conn)
            .await
    }

    /// Insert a new barcode. Codes are immutable, so there is no upsert.
    pub async fn insert(conn: &mut PgConnection, barcode: &Barcode) -> Result<BarcodeRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO barcodes (code, format, product_id, variant_id, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BarcodeRow>(&query)
            .bind(&barcode.code)
            .bind(barcode.format.as_str())
            .bind(barcode.product_id)
            .bind(barcode.variant_id)
            .bind(barcode.created_at)
            .fetch_one(conn)
            .await
    }

    pub async fn delete(conn: &mut PgConnection, code: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM barcodes WHERE code = $1")
            .bind(code)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_by_product(
        conn: &mut PgConnection,
        product_id: DbId,
    ) -> Result<Vec<BarcodeRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM barcodes WHERE product_id = $1 ORDER BY code ASC");
        sqlx::query_as::<_, BarcodeRow>(&query)
            .bind(product_id)
            .fetch_all(conn)
            .await
    }

    pub async fn list_by_variant(
        conn: &mut PgConnection,
        variant_id: DbId,
    ) -> Result<Vec<BarcodeRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM barcodes WHERE variant_id = $1 ORDER BY code ASC");
        sqlx::query_as::<_, BarcodeRow>(&query)
            .bind(variant_id)
            .fetch_all(conn)
            .await
    }
}
