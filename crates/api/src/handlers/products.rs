//! Handlers for the `/products` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use stockroom_core::product::{self, CreateProduct, Product, ProductPage, UpdateProduct};
use stockroom_core::types::DbId;
use stockroom_core::variant::ProductVariant;
use stockroom_core::variant_matrix;
use stockroom_db::PgCatalog;

use crate::error::AppResult;
use crate::query::{PaginationParams, SearchParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/products?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<ProductPage>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let page = product::list_products(&mut uow, params.limit, params.offset).await?;
    Ok(Json(DataResponse::new(page)))
}

/// GET /api/v1/products/search?query=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let products = product::search_products(&mut uow, &params.query).await?;
    Ok(Json(DataResponse::new(products)))
}

/// GET /api/v1/products/by-category/{category_id}
///
/// Includes products filed under the category's direct children.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let products =
        product::list_products_by_category(&mut uow, category_id, params.limit, params.offset)
            .await?;
    Ok(Json(DataResponse::new(products)))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Product>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let product = product::get_product(&mut uow, id).await?;
    Ok(Json(DataResponse::new(product)))
}

/// GET /api/v1/products/{id}/variants
pub async fn variants(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProductVariant>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let variants = variant_matrix::list_product_variants(&mut uow, id).await?;
    Ok(Json(DataResponse::new(variants)))
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let product = product::create_product(&mut uow, input).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(product))))
}

/// PUT /api/v1/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<Product>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let product = product::update_product(&mut uow, id, input).await?;
    uow.commit().await?;
    Ok(Json(DataResponse::new(product)))
}

/// DELETE /api/v1/products/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    product::delete_product(&mut uow, id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
