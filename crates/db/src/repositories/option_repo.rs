//! Repository for `variant_options` and `variant_option_values`.

use sqlx::PgConnection;
use stockroom_core::types::DbId;
use stockroom_core::variant::{VariantOption, VariantOptionValue};

use crate::models::variant::{VariantOptionRow, VariantOptionValueRow};

const OPTION_COLUMNS: &str = "id, name, is_required, display_type, position";

const VALUE_COLUMNS: &str = "id, option_id, value, display_value, position, \
     price_adjustment_type, price_adjustment_value";

pub struct OptionRepo;

impl OptionRepo {
    // -- options --------------------------------------------------------------

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<VariantOptionRow>, sqlx::Error> {
        let query = format!("SELECT {OPTION_COLUMNS} FROM variant_options WHERE id = $1");
        sqlx::query_as::<_, VariantOptionRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list(conn: &mut PgConnection) -> Result<Vec<VariantOptionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {OPTION_COLUMNS} FROM variant_options ORDER BY position ASC, name ASC"
        );
        sqlx::query_as::<_, VariantOptionRow>(&query)
            .fetch_all(conn)
            .await
    }

    pub async fn upsert(
        conn: &mut PgConnection,
        option: &VariantOption,
    ) -> Result<VariantOptionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO variant_options (id, name, is_required, display_type, position)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                is_required = EXCLUDED.is_required,
                display_type = EXCLUDED.display_type,
                position = EXCLUDED.position
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, VariantOptionRow>(&query)
            .bind(option.id)
            .bind(&option.name)
            .bind(option.is_required)
            .bind(option.display_type.as_str())
            .bind(option.position)
            .fetch_one(conn)
            .await
    }

    /// Delete an option; its values follow through `ON DELETE CASCADE`.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM variant_options WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any value of the option appears in a variant combination.
    pub async fn in_use(conn: &mut PgConnection, option_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM variant_combinations c
                JOIN variant_option_values v ON v.id = c.option_value_id
                WHERE v.option_id = $1
             )",
        )
        .bind(option_id)
        .fetch_one(conn)
        .await
    }

    // -- values ---------------------------------------------------------------

    pub async fn find_value(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<VariantOptionValueRow>, sqlx::Error> {
        let query = format!("SELECT {VALUE_COLUMNS} FROM variant_option_values WHERE id = $1");
        sqlx::query_as::<_, VariantOptionValueRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_values_by_ids(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<VariantOptionValueRow>, sqlx::Error> {
        let query =
            format!("SELECT {VALUE_COLUMNS} FROM variant_option_values WHERE id = ANY($1)");
        sqlx::query_as::<_, VariantOptionValueRow>(&query)
            .bind(ids)
            .fetch_all(conn)
            .await
    }

    pub async fn list_values(
        conn: &mut PgConnection,
        option_id: DbId,
    ) -> Result<Vec<VariantOptionValueRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VALUE_COLUMNS} FROM variant_option_values
             WHERE option_id = $1
             ORDER BY position ASC, value ASC"
        );
        sqlx::query_as::<_, VariantOptionValueRow>(&query)
            .bind(option_id)
            .fetch_all(conn)
            .await
    }

    pub async fn upsert_value(
        conn: &mut PgConnection,
        value: &VariantOptionValue,
    ) -> Result<VariantOptionValueRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO variant_option_values
                (id, option_id, value, display_value, position,
                 price_adjustment_type, price_adjustment_value)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                value = EXCLUDED.value,
                display_value = EXCLUDED.display_value,
                position = EXCLUDED.position,
                price_adjustment_type = EXCLUDED.price_adjustment_type,
                price_adjustment_value = EXCLUDED.price_adjustment_value
             RETURNING {VALUE_COLUMNS}"
        );
        sqlx::query_as::<_, VariantOptionValueRow>(&query)
            .bind(value.id)
            .bind(value.option_id)
            .bind(&value.value)
            .bind(&value.display_value)
            .bind(value.position)
            .bind(value.price_adjustment_type.as_str())
            .bind(value.price_adjustment_value)
            .fetch_one(conn)
            .await
    }

    pub async fn delete_value(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM variant_option_values WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn value_in_use(conn: &mut PgConnection, value_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM variant_combinations WHERE option_value_id = $1)",
        )
        .bind(value_id)
        .fetch_one(conn)
        .await
    }
}
