use std::marker::PhantomData;

use schemars::{schema_for, JsonSchema};
use serde::Serialize;

use crate::error::AiError;
use crate::openai::StructuredOutput;
use crate::template;
use crate::traits::Message;

/// A named prompt with a typed input and a typed, schema-checked output.
///
/// The template's `{{var}}` placeholders are filled from the top-level
/// fields of the serialized input.
pub struct PromptSpec<I, O> {
    name: String,
    template: String,
    preamble: Option<String>,
    _types: PhantomData<fn(&I) -> O>,
}

impl<I, O> Clone for PromptSpec<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            template: self.template.clone(),
            preamble: self.preamble.clone(),
            _types: PhantomData,
        }
    }
}

impl<I, O> std::fmt::Debug for PromptSpec<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptSpec")
            .field("name", &self.name)
            .field("preamble", &self.preamble.is_some())
            .finish()
    }
}

impl<I, O> PromptSpec<I, O>
where
    I: Serialize + JsonSchema,
    O: StructuredOutput,
{
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            preamble: None,
            _types: PhantomData,
        }
    }

    /// System instructions sent ahead of the rendered template.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn input_schema() -> serde_json::Value {
        serde_json::to_value(schema_for!(I)).unwrap_or_default()
    }

    /// Top-level property names of the input schema.
    pub fn input_fields() -> Vec<String> {
        Self::input_schema()
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Check that the template only references fields the input provides.
    pub fn validate(&self) -> Result<(), AiError> {
        let fields = Self::input_fields();
        let allowed: Vec<&str> = fields.iter().map(String::as_str).collect();
        template::validate_template(&self.template, &allowed)
            .map_err(|e| AiError::Config(format!("prompt '{}': {e}", self.name)))
    }

    /// Resolve this prompt against one input value.
    pub fn request(&self, input: &I) -> Result<PromptRequest, AiError> {
        let input = serde_json::to_value(input)?;
        let prompt = template::render(&self.template, &template::input_vars(&input));

        Ok(PromptRequest {
            name: self.name.clone(),
            preamble: self.preamble.clone(),
            prompt,
            input_schema: Self::input_schema(),
            output_schema: O::openai_schema(),
            output_type: O::type_name(),
            input,
        })
    }
}

/// One fully resolved prompt, ready to send to any model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub name: String,
    pub preamble: Option<String>,
    pub prompt: String,
    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
    pub output_type: String,
    pub input: serde_json::Value,
}

impl PromptRequest {
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref preamble) = self.preamble {
            messages.push(Message::system(preamble));
        }
        messages.push(Message::user(&self.prompt));
        messages
    }
}
