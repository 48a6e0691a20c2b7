use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use pathwise_common::PathwiseError;
use pathwise_directory::SearchQuery;

use super::error_response;
use crate::AppState;

pub async fn api_colleges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match state.index.search(&query) {
        Ok(page) => Json(page).into_response(),
        Err(PathwiseError::Validation(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            warn!(error = %e, "College search failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to search colleges")
        }
    }
}
