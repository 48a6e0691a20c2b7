use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::AiError;
use crate::util::truncate_to_char_boundary;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 2_000;

pub(crate) struct OpenAiClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AiError::Config(format!("invalid API key header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST one chat completion. Non-2xx responses become [`AiError::Api`]
    /// carrying the status, so rate limits and outages can be told apart.
    pub async fn structured_output(&self, request: &ChatRequest<'_>) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::api(
                status.as_u16(),
                truncate_to_char_boundary(&body, MAX_ERROR_BODY),
            ));
        }

        let chat: ChatResponse = response.json().await?;
        completion_text(chat, request.model)
    }
}

/// The first choice's text. A completion cut off by the token limit is
/// rejected since its JSON would be incomplete.
fn completion_text(chat: ChatResponse, model: &str) -> Result<String, AiError> {
    let usage = chat.usage.unwrap_or_default();
    let choice = chat
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::Parse(format!("{model} returned no choices")))?;

    debug!(
        model,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        finish_reason = ?choice.finish_reason,
        "Completion received"
    );

    if let Some(refusal) = choice.message.refusal {
        return Err(AiError::Parse(format!("{model} refused the request: {refusal}")));
    }

    if choice.finish_reason.as_deref() == Some("length") {
        return Err(AiError::Parse(format!(
            "{model} stopped at the token limit before finishing its response"
        )));
    }

    choice
        .message
        .content
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AiError::Parse(format!("{model} returned an empty response")))
}
