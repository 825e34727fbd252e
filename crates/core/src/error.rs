use crate::barcode::{BarcodeFormat, BarcodeTargetType};
use crate::store::StoreError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid checksum for format {format}")]
    InvalidChecksum { format: BarcodeFormat },

    #[error("Barcode already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Barcode target not found: {target_type} with id {id}")]
    TargetNotFound {
        target_type: BarcodeTargetType,
        id: DbId,
    },

    #[error("Moving category {category_id} under {new_parent_id} would create a cycle")]
    CycleDetected {
        category_id: DbId,
        new_parent_id: DbId,
    },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience alias for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;
