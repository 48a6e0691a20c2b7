mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use async_trait::async_trait;
use tracing::debug;

use crate::dispatch::PromptRequest;
use crate::error::AiError;
use crate::traits::ModelBackend;

use client::OpenAiClient;
use types::*;

/// Backend for any OpenAI-compatible chat-completions API.
///
/// The model is chosen per call, so one instance serves every candidate
/// model a [`crate::Dispatcher`] rotates through.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    base_url: Option<String>,
    temperature: Option<f32>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            temperature: Some(0.7),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    pub(crate) fn structured_request<'a>(
        &self,
        model: &'a str,
        request: &'a PromptRequest,
    ) -> ChatRequest<'a> {
        let temperature = if uses_default_temperature(model) {
            None
        } else {
            self.temperature
        };

        ChatRequest {
            model,
            messages: request.messages().into_iter().map(Into::into).collect(),
            temperature,
            response_format: ResponseFormat {
                json_schema: NamedSchema {
                    name: schema_name(&request.output_type),
                    strict: true,
                    schema: &request.output_schema,
                },
            },
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAi {
    async fn generate(&self, model: &str, request: &PromptRequest) -> Result<String, AiError> {
        debug!(prompt = %request.name, model, "OpenAI-compatible structured request");
        let wire = self.structured_request(model, request);
        self.client().structured_output(&wire).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Response-format names must match `^[a-zA-Z0-9_-]{1,64}$`.
fn schema_name(type_name: &str) -> String {
    let name: String = type_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(64)
        .collect();
    if name.is_empty() {
        "structured_response".to_string()
    } else {
        name
    }
}
