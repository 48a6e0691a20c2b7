pub mod rest;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use pathwise_advisor::AdvisorService;
use pathwise_common::{store_from_config, Config, PathwiseError};
use pathwise_directory::{AcquisitionPipeline, DirectoryIndex};

pub struct AppState {
    pub index: DirectoryIndex,
    pub advisor: AdvisorService,
    /// `None` when no listing source is configured.
    pub pipeline: Option<AcquisitionPipeline>,
    /// Held for the duration of a scrape so runs never overlap.
    pub scrape_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        index: DirectoryIndex,
        advisor: AdvisorService,
        pipeline: Option<AcquisitionPipeline>,
    ) -> Self {
        Self {
            index,
            advisor,
            pipeline,
            scrape_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PathwiseError> {
        let store = store_from_config(config);
        let index = DirectoryIndex::load(&config.colleges_dataset)?;
        let advisor = AdvisorService::from_config(config).with_store(store.clone());

        let pipeline = match AcquisitionPipeline::from_config(config, store) {
            Ok(pipeline) => Some(pipeline),
            Err(e) => {
                warn!(error = %e, "Scrape trigger disabled");
                None
            }
        };

        Ok(Self::new(index, advisor, pipeline))
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Directory
        .route("/api/colleges", get(rest::colleges::api_colleges))
        .route("/api/scrape", get(rest::scrape::api_scrape))
        // Advisor
        .route("/api/advisor/interest-profile", post(rest::advisor::api_interest_profile))
        .route("/api/advisor/stream-suggestion", post(rest::advisor::api_stream_suggestion))
        .route(
            "/api/advisor/degree-recommendation",
            post(rest::advisor::api_degree_recommendation),
        )
        .route("/api/advisor/career-paths", post(rest::advisor::api_career_paths))
        .route("/api/advisor/chat", post(rest::advisor::api_chat))
        .route("/api/advisor/career-plan", post(rest::advisor::api_career_plan))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
