//! Route configuration.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{basket, descriptor};
use crate::state::AppState;

/// Builds the application router.
///
/// Static segments (`/search`, `/upload`) are registered alongside the
/// `{id}` capture; the router prefers the literal match.
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/basketapp/basket/", get(basket::index).post(basket::insert))
        .route("/basketapp/basket/search", get(basket::search))
        .route("/basketapp/basket/upload", post(basket::upload))
        .route("/basketapp/basket/{id}", get(basket::get_by_id))
        .route("/swagger/basketapp.yml", get(descriptor::descriptor))
        .with_state(state)
}
