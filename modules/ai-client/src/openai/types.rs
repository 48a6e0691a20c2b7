//! Chat-completions wire format, limited to what structured output needs.

use serde::{Deserialize, Serialize};

use crate::traits::{Message, MessageRole};

/// Request body. Borrows the model name and schema from the prompt being sent.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OutgoingMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutgoingMessage {
    pub role: &'static str,
    pub content: String,
}

impl From<Message> for OutgoingMessage {
    fn from(message: Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
        };
        Self {
            role,
            content: message.content,
        }
    }
}

/// Serializes as `{"type": "json_schema", "json_schema": {...}}`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "json_schema")]
pub(crate) struct ResponseFormat<'a> {
    pub json_schema: NamedSchema<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NamedSchema<'a> {
    pub name: String,
    pub strict: bool,
    pub schema: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ReplyMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// Set instead of `content` when the model declines the request.
    #[serde(default)]
    pub refusal: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

const FIXED_TEMPERATURE_FAMILIES: &[&str] = &["o1", "o3", "o4", "gpt-5"];

/// Reasoning model families reject any temperature but their default.
/// A `provider/` prefix on the model name is ignored.
pub(crate) fn uses_default_temperature(model: &str) -> bool {
    let base = model.rsplit('/').next().unwrap_or(model);
    FIXED_TEMPERATURE_FAMILIES
        .iter()
        .any(|family| base.starts_with(family))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gemini_style_response() {
        let body = r#"{
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"reply\":\"hi\"}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let choice = &response.choices[0];

        assert_eq!(choice.message.content.as_deref(), Some("{\"reply\":\"hi\"}"));
        assert_eq!(choice.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.unwrap().completion_tokens, 4);
    }

    #[test]
    fn usage_is_optional() {
        let body = r#"{"choices": [{"message": {"role": "assistant"}}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(response.usage.is_none());
        assert!(response.choices[0].message.content.is_none());
        assert!(response.choices[0].finish_reason.is_none());
    }

    #[test]
    fn maps_message_roles() {
        let system = OutgoingMessage::from(Message::system("be brief"));
        let user = OutgoingMessage::from(Message::user("hello"));
        assert_eq!(system.role, "system");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "hello");
    }

    #[test]
    fn detects_default_temperature_models() {
        assert!(uses_default_temperature("o3-mini"));
        assert!(uses_default_temperature("gpt-5"));
        assert!(uses_default_temperature("openai/o1-preview"));
        assert!(!uses_default_temperature("gemini-2.0-flash"));
        assert!(!uses_default_temperature("gpt-4o"));
    }
}
