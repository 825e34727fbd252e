//! Handlers for the `/categories` resource.
//!
//! Every handler opens one [`PgCatalog`] transaction. Mutations commit it on
//! success; failures and reads let it drop, which rolls back.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Deserializer};
use stockroom_core::category::{
    Category, CategoryNode, CategoryStatistics, CreateCategory, ReorderItem, UpdateCategory,
};
use stockroom_core::category_tree;
use stockroom_core::types::DbId;
use stockroom_db::PgCatalog;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /categories/move`. A missing, blank or nil parent detaches
/// to the root.
#[derive(Debug, Deserialize)]
pub struct MoveCategoryRequest {
    pub category_id: DbId,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub new_parent_id: Option<DbId>,
}

/// Reads an optional id, treating `null` and whitespace-only strings as absent.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<DbId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => id.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let categories = category_tree::list_categories(&mut uow).await?;
    Ok(Json(DataResponse::new(categories)))
}

/// GET /api/v1/categories/tree
pub async fn tree(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<CategoryNode>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let tree = category_tree::category_tree(&mut uow).await?;
    Ok(Json(DataResponse::new(tree)))
}

/// GET /api/v1/categories/statistics
pub async fn statistics(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CategoryStatistics>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let stats = category_tree::category_statistics(&mut uow).await?;
    Ok(Json(DataResponse::new(stats)))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Category>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let category = category_tree::get_category(&mut uow, id).await?;
    Ok(Json(DataResponse::new(category)))
}

/// GET /api/v1/categories/{id}/children
pub async fn children(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let children = category_tree::list_children(&mut uow, id).await?;
    Ok(Json(DataResponse::new(children)))
}

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<Category>>)> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let category = category_tree::create_category(&mut uow, input).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// PUT /api/v1/categories/{id}
///
/// Absent fields are left unchanged. A changed `parent_id` is not checked for
/// cycles here; clients should use `/categories/move`.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<Category>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let category = category_tree::update_category(&mut uow, id, input).await?;
    uow.commit().await?;
    Ok(Json(DataResponse::new(category)))
}

/// POST /api/v1/categories/move
pub async fn move_category(
    State(state): State<AppState>,
    Json(input): Json<MoveCategoryRequest>,
) -> AppResult<Json<DataResponse<Category>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let category =
        category_tree::move_category(&mut uow, input.category_id, input.new_parent_id).await?;
    uow.commit().await?;
    Ok(Json(DataResponse::new(category)))
}

/// POST /api/v1/categories/reorder
pub async fn reorder(
    State(state): State<AppState>,
    Json(items): Json<Vec<ReorderItem>>,
) -> AppResult<Json<DataResponse<Vec<Category>>>> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    let categories = category_tree::reorder_categories(&mut uow, &items).await?;
    uow.commit().await?;
    Ok(Json(DataResponse::new(categories)))
}

/// DELETE /api/v1/categories/{id}
///
/// Removes the category and its whole subtree.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let mut uow = PgCatalog::begin(&state.pool).await?;
    category_tree::delete_category(&mut uow, id).await?;
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    const CATEGORY: &str = "6f1c2d4e-8a7b-4c3d-9e2f-1a2b3c4d5e6f";

    fn parse(body: serde_json::Value) -> serde_json::Result<MoveCategoryRequest> {
        serde_json::from_value(body)
    }

    #[test]
    fn blank_parent_detaches_to_root() {
        let req = parse(json!({"category_id": CATEGORY, "new_parent_id": ""})).unwrap();
        assert_eq!(req.new_parent_id, None);

        let req = parse(json!({"category_id": CATEGORY, "new_parent_id": "  "})).unwrap();
        assert_eq!(req.new_parent_id, None);
    }

    #[test]
    fn missing_or_null_parent_detaches_to_root() {
        let req = parse(json!({"category_id": CATEGORY})).unwrap();
        assert_eq!(req.new_parent_id, None);

        let req = parse(json!({"category_id": CATEGORY, "new_parent_id": null})).unwrap();
        assert_eq!(req.new_parent_id, None);
    }

    #[test]
    fn parent_id_is_parsed() {
        let req = parse(json!({"category_id": CATEGORY, "new_parent_id": CATEGORY})).unwrap();
        assert_eq!(req.new_parent_id, Some(req.category_id));
    }

    #[test]
    fn malformed_parent_is_rejected() {
        assert_matches!(
            parse(json!({"category_id": CATEGORY, "new_parent_id": "not-a-uuid"})),
            Err(_)
        );
    }
}
