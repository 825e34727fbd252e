pub mod barcodes;
pub mod categories;
pub mod health;
pub mod products;
pub mod variants;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /categories                                      list, create
/// /categories/tree                                 nested forest (GET)
/// /categories/statistics                           counts (GET)
/// /categories/move                                 re-parent (POST)
/// /categories/reorder                              bulk positions (POST)
/// /categories/{id}                                 get, update, delete
/// /categories/{id}/children                        direct children (GET)
///
/// /products                                        list (?limit, offset), create
/// /products/search                                 search (?query)
/// /products/by-category/{category_id}              list incl. direct children
/// /products/{id}                                   get, update, delete
/// /products/{id}/variants                          variants of a product (GET)
///
/// /variants/options                                list, create
/// /variants/options/{id}                           delete
/// /variants/options/{id}/values                    list, create
/// /variants/options/{id}/values/{value_id}         delete
/// /variants/generate-matrix                        generate (POST)
/// /variants/{id}/inventory                         stock level (PUT)
/// /variants/{id}/pricing                           price (PUT)
/// /variants/{id}/signature                         option values (GET)
///
/// /barcodes/scan                                   scan (POST)
/// /barcodes/lookup/{code}                          scan by path (GET)
/// /barcodes/assign                                 register (POST)
/// /barcodes/validate                               checksum only (POST)
/// /barcodes/targets/{target_type}/{id}             codes of a target (GET)
/// /barcodes/{code}                                 delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/variants", variants::router())
        .nest("/barcodes", barcodes::router())
}
