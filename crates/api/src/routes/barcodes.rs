use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::barcodes;
use crate::state::AppState;

/// Routes mounted at `/barcodes`.
///
/// ```text
/// POST   /scan                           -> scan_by_body
/// GET    /lookup/{code}                  -> lookup
/// POST   /assign                         -> assign
/// POST   /validate                       -> validate
/// GET    /targets/{target_type}/{id}     -> list_for_target
/// DELETE /{code}                         -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scan", post(barcodes::scan_by_body))
        .route("/lookup/{code}", get(barcodes::lookup))
        .route("/assign", post(barcodes::assign))
        .route("/validate", post(barcodes::validate))
        .route("/targets/{target_type}/{id}", get(barcodes::list_for_target))
        .route("/{code}", delete(barcodes::delete))
}
