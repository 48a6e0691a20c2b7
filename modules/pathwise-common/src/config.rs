use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::PathwiseError;

/// Gemini's OpenAI-compatible endpoint.
const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const DEFAULT_AI_MODELS: &str = "gemini-2.0-flash,gemini-1.5-flash,gemini-1.5-pro";
const DEFAULT_USER_AGENT: &str = "PathwiseDirectoryBot/1.0 (college directory indexer)";

/// Application configuration loaded from environment variables.
///
/// A `.env` file in the working directory is loaded first when present.
#[derive(Debug, Clone)]
pub struct Config {
    // AI providers
    pub ai_api_key: String,
    pub ai_base_url: String,
    /// Candidate models, in rotation order.
    pub ai_models: Vec<String>,

    // Document store
    pub firestore_project_id: Option<String>,
    pub firestore_token: Option<String>,
    pub firestore_base_url: Option<String>,
    pub colleges_collection: String,

    // Directory
    pub colleges_dataset: PathBuf,
    pub scrape: ScrapeConfig,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

/// Settings for one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Listing URL with a `{page}` placeholder.
    pub source_url: Option<String>,
    /// Highest page number fetched.
    pub max_pages: u32,
    /// Fetch attempts per page before giving up.
    pub max_retries: u32,
    /// Retry delay is `retry_base * attempt`.
    pub retry_base: Duration,
    pub page_delay: Duration,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            max_pages: 50,
            max_retries: 3,
            retry_base: Duration::from_millis(2_000),
            page_delay: Duration::from_millis(1_000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Full configuration for the API server. `AI_API_KEY` is required.
    pub fn from_env() -> Result<Self, PathwiseError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok(), true)
    }

    /// Configuration for the maintenance CLI, which never calls a model.
    pub fn directory_from_env() -> Result<Self, PathwiseError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok(), false)
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        require_ai: bool,
    ) -> Result<Self, PathwiseError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ai_api_key = match var("AI_API_KEY") {
            Some(key) => key,
            None if require_ai => {
                return Err(PathwiseError::Config(
                    "AI_API_KEY environment variable is required".to_string(),
                ))
            }
            None => String::new(),
        };

        let ai_models: Vec<String> = var("AI_MODELS")
            .unwrap_or_else(|| DEFAULT_AI_MODELS.to_string())
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        let firestore_base_url = var("FIRESTORE_BASE_URL")
            .or_else(|| var("FIRESTORE_EMULATOR_HOST").map(|host| format!("http://{host}/v1")));

        let defaults = ScrapeConfig::default();
        let scrape = ScrapeConfig {
            source_url: var("SCRAPE_SOURCE_URL"),
            max_pages: parse_or(&var, "SCRAPE_MAX_PAGES", defaults.max_pages)?,
            max_retries: parse_or(&var, "SCRAPE_MAX_RETRIES", defaults.max_retries)?.max(1),
            retry_base: Duration::from_millis(parse_or(
                &var,
                "SCRAPE_RETRY_BASE_MS",
                defaults.retry_base.as_millis() as u64,
            )?),
            page_delay: Duration::from_millis(parse_or(
                &var,
                "SCRAPE_PAGE_DELAY_MS",
                defaults.page_delay.as_millis() as u64,
            )?),
            user_agent: var("SCRAPE_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        Ok(Self {
            ai_api_key,
            ai_base_url: var("AI_BASE_URL").unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            ai_models,
            firestore_project_id: var("FIRESTORE_PROJECT_ID"),
            firestore_token: var("FIRESTORE_TOKEN"),
            firestore_base_url,
            colleges_collection: var("COLLEGES_COLLECTION")
                .unwrap_or_else(|| "colleges".to_string()),
            colleges_dataset: var("COLLEGES_DATASET")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/colleges.json")),
            scrape,
            web_host: var("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port: parse_or(&var, "WEB_PORT", 3000)?,
        })
    }

    /// Log the configuration with secrets masked.
    pub fn log_redacted(&self) {
        info!(
            ai_base_url = %self.ai_base_url,
            ai_models = ?self.ai_models,
            ai_api_key = redact(&self.ai_api_key),
            firestore_project_id = ?self.firestore_project_id,
            firestore_token = redact(self.firestore_token.as_deref().unwrap_or_default()),
            firestore_base_url = ?self.firestore_base_url,
            colleges_collection = %self.colleges_collection,
            colleges_dataset = %self.colleges_dataset.display(),
            scrape_source_url = ?self.scrape.source_url,
            scrape_max_pages = self.scrape.max_pages,
            web_host = %self.web_host,
            web_port = self.web_port,
            "Configuration loaded"
        );
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, PathwiseError> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PathwiseError::Config(format!("{key} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
