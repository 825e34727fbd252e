//! Handlers for variant options, option values, and generated variants.
//!
//! Mounted at `/variants`. Listing a product's variants lives under
//! `/products/{id}/variants`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use stockroom_core::types::{DbId, Money};
use stockroom_core::variant::{
    CreateOption, CreateOptionValue, GenerateMatrix, ProductVariant, VariantOption,
    VariantOptionValue, VariantSignature,
};
use stockroom_core::variant_matrix;
use stockroom_db::PgCatalog;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub stock_level: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePricingRequest {
    pub price: Money,
}

/// GET /api/v1/variants/options
pub async fn list_options(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<VariantOption>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let options = variant_matrix::list_options(&mut uow).await?;
    Ok(Json(DataResponse::new(options)))
}

/// POST /api/v1/variants/options
pub async fn create_option(
    State(state): State<AppState>,
    Json(input): Json<CreateOption>,
) -> AppResult<(StatusCode, Json<DataResponse<VariantOption>>)> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let option = variant_matrix::create_option(&mut uow, input).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(option))))
}

/// DELETE /api/v1/variants/options/{id}
///
/// Rejected with 409 while any generated variant uses one of its values.
pub async fn delete_option(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    variant_matrix::delete_option(&mut uow, id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/variants/options/{id}/values
pub async fn list_values(
    State(state): State<AppState>,
    Path(option_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<VariantOptionValue>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let values = variant_matrix::list_option_values(&mut uow, option_id).await?;
    Ok(Json(DataResponse::new(values)))
}

/// POST /api/v1/variants/options/{id}/values
pub async fn create_value(
    State(state): State<AppState>,
    Path(option_id): Path<DbId>,
    Json(input): Json<CreateOptionValue>,
) -> AppResult<(StatusCode, Json<DataResponse<VariantOptionValue>>)> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let value = variant_matrix::create_option_value(&mut uow, option_id, input).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(value))))
}

/// DELETE /api/v1/variants/options/{id}/values/{value_id}
pub async fn delete_value(
    State(state): State<AppState>,
    Path((option_id, value_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    variant_matrix::delete_option_value(&mut uow, option_id, value_id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/variants/generate-matrix
///
/// Responds with only the variants created by this call; combinations that
/// already exist are skipped.
pub async fn generate_matrix(
    State(state): State<AppState>,
    Json(input): Json<GenerateMatrix>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<ProductVariant>>>)> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let created = variant_matrix::generate_matrix(&mut uow, input).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

/// PUT /api/v1/variants/{id}/inventory
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateInventoryRequest>,
) -> AppResult<Json<DataResponse<ProductVariant>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let variant = variant_matrix::update_variant_inventory(&mut uow, id, input.stock_level).await?;
    uow.commit().await?;
    Ok(Json(DataResponse::new(variant)))
}

/// PUT /api/v1/variants/{id}/pricing
pub async fn update_pricing(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePricingRequest>,
) -> AppResult<Json<DataResponse<ProductVariant>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let variant = variant_matrix::update_variant_pricing(&mut uow, id, input.price).await?;
    uow.commit().await?;
    Ok(Json(DataResponse::new(variant)))
}

/// GET /api/v1/variants/{id}/signature
pub async fn signature(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VariantSignature>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let signature = variant_matrix::variant_signature(&mut uow, id).await?;
    Ok(Json(DataResponse::new(signature)))
}
