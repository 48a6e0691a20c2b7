use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use ai_client::DispatchError;
use pathwise_advisor::*;

use super::error_response;
use crate::AppState;

fn respond<T: Serialize>(result: Result<T, AdvisorError>) -> Response {
    match result {
        Ok(output) => Json(output).into_response(),
        Err(e) => advisor_error(e),
    }
}

/// Exhaustion → 503, other model failures → 502, bad input → 400.
pub fn advisor_error(err: AdvisorError) -> Response {
    let status = match &err {
        AdvisorError::Validation(_) => StatusCode::BAD_REQUEST,
        AdvisorError::Dispatch(DispatchError::Exhausted { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        AdvisorError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        AdvisorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, status = status.as_u16(), "Advisor request failed");
    } else {
        warn!(error = %err, "Rejected advisor request");
    }

    error_response(status, err.to_string())
}

pub async fn api_interest_profile(
    State(state): State<Arc<AppState>>,
    Json(input): Json<InterestProfileInput>,
) -> Response {
    respond(state.advisor.interest_profile(&input).await)
}

pub async fn api_stream_suggestion(
    State(state): State<Arc<AppState>>,
    Json(input): Json<StreamSuggestionInput>,
) -> Response {
    respond(state.advisor.stream_suggestion(&input).await)
}

pub async fn api_degree_recommendation(
    State(state): State<Arc<AppState>>,
    Json(input): Json<DegreeRecommendationInput>,
) -> Response {
    respond(state.advisor.degree_recommendation(&input).await)
}

pub async fn api_career_paths(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CareerPathsInput>,
) -> Response {
    respond(state.advisor.career_paths(&input).await)
}

pub async fn api_chat(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ChatInput>,
) -> Response {
    respond(state.advisor.chat(&input).await)
}

pub async fn api_career_plan(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CareerPlanInput>,
) -> Response {
    respond(state.advisor.create_career_plan(&input).await)
}
