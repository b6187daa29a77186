//! Handlers for the basket endpoints.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use basketapp_storage::model::Basket;
use basketapp_storage::query::BasketQuery;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// `GET /basketapp/basket/` - liveness probe for the basket endpoint.
pub async fn index() -> StatusCode {
    StatusCode::OK
}

/// `GET /basketapp/basket/{id}` - fetches one basket.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> RestResult<Json<Basket>> {
    let accessor = state.storage.accessor::<Basket>()?;
    match accessor.get_by_id(id).await? {
        Some(basket) => Ok(Json(basket)),
        None => Err(RestError::NotFound { id }),
    }
}

/// Query parameters of the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Exact store code to match.
    pub store_code: Option<String>,
    /// Exact product code to match within items.
    pub product_code: Option<String>,
}

/// `GET /basketapp/basket/search` - filtered search through the index.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> RestResult<Json<Vec<Basket>>> {
    let query = BasketQuery {
        store_code: params.store_code,
        product_code: params.product_code,
    };
    let accessor = state.storage.accessor::<Basket>()?;
    let baskets = accessor.search(&query).await?;
    Ok(Json(baskets))
}

/// `POST /basketapp/basket/` - ingests one basket.
///
/// Returns `202 Accepted`: the row is written, but its visibility in the
/// search index is the backend's business.
pub async fn insert(
    State(state): State<AppState>,
    Json(basket): Json<Basket>,
) -> RestResult<StatusCode> {
    debug!(id = %basket.id, "Inserting basket");
    let accessor = state.storage.accessor::<Basket>()?;
    accessor.save(&basket).await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /basketapp/basket/upload` - bulk upload entry point.
///
/// The payload is received and acknowledged; ingestion of uploaded files
/// is not wired up yet.
pub async fn upload(mut multipart: Multipart) -> RestResult<StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RestError::BadRequest {
            message: format!("invalid multipart payload: {e}"),
        })?
    {
        let name = field.file_name().unwrap_or("<unnamed>").to_string();
        let content_type = field.content_type().unwrap_or("<unknown>").to_string();
        let bytes = field.bytes().await.map_err(|e| RestError::BadRequest {
            message: format!("could not read upload: {e}"),
        })?;
        info!(file = %name, content_type = %content_type, size = bytes.len(), "Received upload");
    }
    Ok(StatusCode::OK)
}
