use async_trait::async_trait;

use crate::dispatch::PromptRequest;
use crate::error::AiError;

/// Who a prompt message speaks for. Conversation history is rendered into
/// the user message, so there is no assistant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A text-generation service that can run one structured prompt against a
/// named model. Implementations make exactly one attempt per call; retries
/// and model selection belong to [`crate::Dispatcher`].
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run `request` on `model` and return the raw response text, expected to
    /// be JSON matching `request.output_schema`.
    async fn generate(&self, model: &str, request: &PromptRequest) -> Result<String, AiError>;

    fn name(&self) -> &str {
        "unknown"
    }
}
