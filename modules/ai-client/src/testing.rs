// Scripted ModelBackend for tests: queued responses per model, with a record
// of every model called and every request seen.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::dispatch::PromptRequest;
use crate::error::AiError;
use crate::traits::ModelBackend;

#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, AiError>>>>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<PromptRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful raw response for `model`.
    pub fn on_success(self, model: &str, body: &str) -> Self {
        self.push(model, Ok(body.to_string()))
    }

    /// Queue a failure for `model`.
    pub fn on_error(self, model: &str, error: AiError) -> Self {
        self.push(model, Err(error))
    }

    fn push(self, model: &str, response: Result<String, AiError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Models called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, model: &str, request: &PromptRequest) -> Result<String, AiError> {
        self.calls.lock().unwrap().push(model.to_string());
        self.requests.lock().unwrap().push(request.clone());
        self.scripts
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(AiError::Config(format!("no scripted response for {model}"))))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
