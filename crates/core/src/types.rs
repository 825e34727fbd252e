use crate::error::{CoreError, CoreResult};

/// All primary keys are UUIDs generated by the engine.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Prices, costs, and adjustments are exact decimals.
pub type Money = rust_decimal::Decimal;

/// Generate a fresh identifier for a new record.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}

/// Current wall-clock time, used to stamp `created_at` / `updated_at`.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// Decimal places kept for money columns.
pub const MONEY_SCALE: u32 = 2;

/// Reject amounts carrying more decimal places than [`MONEY_SCALE`].
///
/// Trailing zeros don't count, so `1.500` is accepted.
pub fn validate_money_scale(amount: Money, field: &str) -> CoreResult<()> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(CoreError::BadRequest(format!(
            "{field} must have at most {MONEY_SCALE} decimal places"
        )));
    }
    Ok(())
}

/// Prices and costs: non-negative (negative zero counts as zero) and within
/// [`MONEY_SCALE`].
pub fn validate_price(amount: Money, field: &str) -> CoreResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::BadRequest(format!("{field} must not be negative")));
    }
    validate_money_scale(amount, field)
}
