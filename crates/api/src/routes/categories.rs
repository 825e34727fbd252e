use axum::routing::{get, post};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// GET    /tree            -> tree
/// GET    /statistics      -> statistics
/// POST   /move            -> move_category
/// POST   /reorder         -> reorder
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// GET    /{id}/children   -> children
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route("/tree", get(categories::tree))
        .route("/statistics", get(categories::statistics))
        .route("/move", post(categories::move_category))
        .route("/reorder", post(categories::reorder))
        .route(
            "/{id}",
            get(categories::get_by_id)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/{id}/children", get(categories::children))
}
