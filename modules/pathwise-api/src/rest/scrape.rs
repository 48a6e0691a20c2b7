use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{info, warn};

use pathwise_common::ScrapeSummary;
use pathwise_directory::StopReason;

use super::error_response;
use crate::AppState;

/// Run the acquisition pipeline to completion and report its summary.
///
/// A run that stops on a fetch failure still answers 200: the failure is
/// already listed in the summary's `errors`. Only a persistence failure
/// answers 500, with the summary as `details`.
pub async fn api_scrape(State(state): State<Arc<AppState>>) -> Response {
    let Some(ref pipeline) = state.pipeline else {
        return failure("Scraping is not configured", ScrapeSummary::default());
    };

    let Ok(_guard) = state.scrape_lock.try_lock() else {
        return error_response(StatusCode::CONFLICT, "A scrape is already running");
    };

    info!("Scrape triggered over HTTP");
    let report = pipeline.run().await;

    match report.stop {
        StopReason::PersistFailed(page) => {
            warn!(page, errors = report.summary.errors.len(), "Scrape failed to persist records");
            failure("Scraping failed", report.summary)
        }
        stop => {
            if !report.summary.is_clean() {
                warn!(?stop, errors = report.summary.errors.len(), "Scrape stopped early");
            }
            Json(report.summary).into_response()
        }
    }
}

fn failure(message: &str, summary: ScrapeSummary) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message, "details": summary })),
    )
        .into_response()
}
