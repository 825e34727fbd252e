//! Handlers for the `/barcodes` resource: scanning, assignment, and
//! checksum validation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use stockroom_core::barcode::{
    self, AssignBarcode, Barcode, BarcodeFormat, BarcodeTarget, BarcodeTargetType, ScanResult,
};
use stockroom_core::types::DbId;
use stockroom_db::PgCatalog;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub barcode: String,
}

/// Body of `POST /barcodes/assign`.
///
/// `format` and `target_type` arrive as strings so unknown values map to a
/// 400 with a readable message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct AssignBarcodeRequest {
    pub barcode: String,
    pub format: String,
    pub target_id: DbId,
    pub target_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub barcode: String,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub barcode: String,
    pub format: BarcodeFormat,
    pub valid: bool,
}

async fn scan(state: &AppState, code: &str) -> AppResult<(StatusCode, Json<DataResponse<ScanResult>>)> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let result = barcode::scan_barcode(&mut uow, code).await?;
    let status = if result.found {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(DataResponse::new(result))))
}

/// POST /api/v1/barcodes/scan
///
/// An unknown or dangling code answers 404 with `found: false` in the body.
pub async fn scan_by_body(
    State(state): State<AppState>,
    Json(input): Json<ScanRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ScanResult>>)> {
    scan(&state, &input.barcode).await
}

/// GET /api/v1/barcodes/lookup/{code}
pub async fn lookup(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<(StatusCode, Json<DataResponse<ScanResult>>)> {
    scan(&state, &code).await
}

/// POST /api/v1/barcodes/assign
pub async fn assign(
    State(state): State<AppState>,
    Json(input): Json<AssignBarcodeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Barcode>>)> {
    let format: BarcodeFormat = input.format.parse()?;
    let target_type: BarcodeTargetType = input.target_type.parse()?;

    let mut uow = PgCatalog::begin(&state.pool).await?;
    let barcode = barcode::assign_barcode(
        &mut uow,
        AssignBarcode {
            code: input.barcode,
            format,
            target: BarcodeTarget::new(target_type, input.target_id),
        },
    )
    .await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(barcode))))
}

/// POST /api/v1/barcodes/validate
///
/// Checksum only; does not touch the database.
pub async fn validate(
    Json(input): Json<ValidateRequest>,
) -> AppResult<Json<DataResponse<ValidateResponse>>> {
    let format: BarcodeFormat = input.format.parse()?;
    let valid = barcode::validate_checksum(&input.barcode, format);
    Ok(Json(DataResponse::new(ValidateResponse {
        barcode: input.barcode,
        format,
        valid,
    })))
}

/// GET /api/v1/barcodes/targets/{target_type}/{id}
pub async fn list_for_target(
    State(state): State<AppState>,
    Path((target_type, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Vec<Barcode>>>> {
    let target_type: BarcodeTargetType = target_type.parse()?;
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let barcodes =
        barcode::barcodes_for_target(&mut uow, BarcodeTarget::new(target_type, id)).await?;
    Ok(Json(DataResponse::new(barcodes)))
}

/// DELETE /api/v1/barcodes/{code}
pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<StatusCode> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    barcode::delete_barcode(&mut uow, &code).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
