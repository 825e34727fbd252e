//! Database row structs.
//!
//! Each submodule contains a `FromRow` struct matching one table (or one
//! aggregate query) and its conversion into the matching core record.
//! Closed enumerations are stored as `TEXT` and parsed on the way out, so a
//! row holding an unknown tag surfaces as a backend error instead of being
//! silently coerced.

use std::str::FromStr;

use stockroom_core::error::CoreError;
use stockroom_core::store::{StoreError, StoreResult};

pub mod barcode;
pub mod category;
pub mod product;
pub mod variant;

/// Parse a `TEXT` enum column.
pub(crate) fn parse_column<T>(value: &str) -> StoreResult<T>
where
    T: FromStr<Err = CoreError>,
{
    value.parse().map_err(StoreError::backend)
}
