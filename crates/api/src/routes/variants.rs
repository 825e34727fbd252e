use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::variants;
use crate::state::AppState;

/// Routes mounted at `/variants`.
///
/// ```text
/// GET    /options                          -> list_options
/// POST   /options                          -> create_option
/// DELETE /options/{id}                     -> delete_option
/// GET    /options/{id}/values              -> list_values
/// POST   /options/{id}/values              -> create_value
/// DELETE /options/{id}/values/{value_id}   -> delete_value
/// POST   /generate-matrix                  -> generate_matrix
/// PUT    /{id}/inventory                   -> update_inventory
/// PUT    /{id}/pricing                     -> update_pricing
/// GET    /{id}/signature                   -> signature
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/options",
            get(variants::list_options).post(variants::create_option),
        )
        .route("/options/{id}", delete(variants::delete_option))
        .route(
            "/options/{id}/values",
            get(variants::list_values).post(variants::create_value),
        )
        .route(
            "/options/{id}/values/{value_id}",
            delete(variants::delete_value),
        )
        .route("/generate-matrix", post(variants::generate_matrix))
        .route("/{id}/inventory", put(variants::update_inventory))
        .route("/{id}/pricing", put(variants::update_pricing))
        .route("/{id}/signature", get(variants::signature))
}
