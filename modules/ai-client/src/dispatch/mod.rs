//! Model-fallback dispatch: run one structured prompt against a rotating
//! list of candidate models, moving on when a model is rate limited, over
//! quota, or erroring server-side.

mod classify;
mod prompt;
mod rotation;

pub use classify::{classify, FailureKind};
pub use prompt::{PromptRequest, PromptSpec};
pub use rotation::ModelRotation;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::AiError;
use crate::openai::StructuredOutput;
use crate::traits::ModelBackend;
use crate::util::strip_code_blocks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    FatalFailure,
}

/// One model tried during a single dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAttempt {
    pub model: String,
    /// 1-based position within the dispatch.
    pub attempt: usize,
    pub outcome: AttemptOutcome,
}

/// A successful dispatch: the validated output plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Dispatched<O> {
    pub output: O,
    pub model: String,
    pub attempts: Vec<ModelAttempt>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "All AI models are currently unavailable ({} tried). Please try again later.",
        attempts.len()
    )]
    Exhausted { attempts: Vec<ModelAttempt> },

    #[error("{source}")]
    Fatal {
        source: AiError,
        attempts: Vec<ModelAttempt>,
    },

    #[error("Model {model} returned output that does not match the schema: {message}")]
    InvalidOutput {
        model: String,
        message: String,
        attempts: Vec<ModelAttempt>,
    },

    #[error("Failed to build prompt: {0}")]
    Prompt(AiError),
}

impl DispatchError {
    pub fn attempts(&self) -> &[ModelAttempt] {
        match self {
            DispatchError::Exhausted { attempts }
            | DispatchError::Fatal { attempts, .. }
            | DispatchError::InvalidOutput { attempts, .. } => attempts,
            DispatchError::Prompt(_) => &[],
        }
    }
}

/// Runs prompts against an ordered list of candidate models.
///
/// Each dispatch makes at most one attempt per model, starting wherever the
/// rotation currently points. Retryable failures (see [`classify`]) move on
/// to the next model; the first fatal failure ends the dispatch.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn ModelBackend>,
    models: Vec<String>,
    rotation: Arc<ModelRotation>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn ModelBackend>, models: Vec<String>) -> Self {
        Self {
            backend,
            models,
            rotation: Arc::new(ModelRotation::new()),
        }
    }

    /// Share a rotation with other dispatchers.
    pub fn with_rotation(mut self, rotation: Arc<ModelRotation>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn rotation(&self) -> &ModelRotation {
        &self.rotation
    }

    pub async fn dispatch<I, O>(
        &self,
        spec: &PromptSpec<I, O>,
        input: &I,
    ) -> Result<Dispatched<O>, DispatchError>
    where
        I: Serialize + JsonSchema + Sync,
        O: StructuredOutput + Send,
    {
        let request = spec.request(input).map_err(DispatchError::Prompt)?;
        self.dispatch_request(&request).await
    }

    /// Dispatch an already-resolved request, deserializing into `O`.
    pub async fn dispatch_request<O>(
        &self,
        request: &PromptRequest,
    ) -> Result<Dispatched<O>, DispatchError>
    where
        O: StructuredOutput + Send,
    {
        let total = self.models.len();
        let mut attempts = Vec::with_capacity(total);

        if total == 0 {
            warn!(prompt = %request.name, "No candidate models configured");
            return Err(DispatchError::Exhausted { attempts });
        }

        // Read the start once so a concurrent dispatch advancing the shared
        // rotation cannot make this one revisit a model.
        let start = self.rotation.current();

        for k in 0..total {
            self.rotation.advance();
            let model = &self.models[start.wrapping_add(k) % total];
            let attempt = k + 1;

            info!(
                prompt = %request.name,
                model = %model,
                attempt,
                total,
                "Dispatching prompt"
            );

            let error = match self.backend.generate(model, request).await {
                Ok(raw) => {
                    return match serde_json::from_str::<O>(strip_code_blocks(&raw)) {
                        Ok(output) => {
                            attempts.push(record(model, attempt, AttemptOutcome::Success));
                            Ok(Dispatched {
                                output,
                                model: model.clone(),
                                attempts,
                            })
                        }
                        Err(e) => {
                            warn!(
                                prompt = %request.name,
                                model = %model,
                                error = %e,
                                "Model output failed schema validation"
                            );
                            attempts.push(record(model, attempt, AttemptOutcome::FatalFailure));
                            Err(DispatchError::InvalidOutput {
                                model: model.clone(),
                                message: e.to_string(),
                                attempts,
                            })
                        }
                    };
                }
                Err(error) => error,
            };

            match classify(&error) {
                FailureKind::Retryable => {
                    warn!(
                        prompt = %request.name,
                        model = %model,
                        attempt,
                        error = %error,
                        "Retryable model failure, moving to next model"
                    );
                    attempts.push(record(model, attempt, AttemptOutcome::RetryableFailure));
                }
                FailureKind::Fatal => {
                    warn!(
                        prompt = %request.name,
                        model = %model,
                        attempt,
                        error = %error,
                        "Fatal model failure"
                    );
                    attempts.push(record(model, attempt, AttemptOutcome::FatalFailure));
                    return Err(DispatchError::Fatal {
                        source: error,
                        attempts,
                    });
                }
            }
        }

        warn!(prompt = %request.name, total, "All candidate models failed");
        Err(DispatchError::Exhausted { attempts })
    }
}

fn record(model: &str, attempt: usize, outcome: AttemptOutcome) -> ModelAttempt {
    ModelAttempt {
        model: model.to_string(),
        attempt,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use serde::Deserialize;

    #[derive(Serialize, JsonSchema)]
    struct Question {
        text: String,
    }

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Answer {
        answer: String,
    }

    fn spec() -> PromptSpec<Question, Answer> {
        PromptSpec::new("qa", "Answer this: {{text}}")
    }

    fn question() -> Question {
        Question {
            text: "What is a stream?".into(),
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    const OK: &str = r#"{"answer":"ok"}"#;

    #[tokio::test]
    async fn succeeds_on_last_model_after_retryable_failures() {
        for n in 1..=4 {
            let names: Vec<String> = (0..n).map(|i| format!("m{i}")).collect();
            let mut backend = ScriptedBackend::new();
            for name in &names[..n - 1] {
                backend = backend.on_error(name, AiError::api(429, "rate limited"));
            }
            backend = backend.on_success(&names[n - 1], OK);
            let backend = Arc::new(backend);

            let dispatcher = Dispatcher::new(backend.clone(), names.clone());
            let result = dispatcher.dispatch(&spec(), &question()).await.unwrap();

            assert_eq!(result.output.answer, "ok");
            assert_eq!(result.model, names[n - 1]);
            assert_eq!(result.attempts.len(), n);
            assert_eq!(backend.calls(), names);
        }
    }

    #[tokio::test]
    async fn exhausts_after_exactly_one_attempt_per_model() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .on_error("a", AiError::api(500, "internal"))
                .on_error("b", AiError::api(503, "unavailable"))
                .on_error("c", AiError::Other("quota exceeded".into())),
        );
        let dispatcher = Dispatcher::new(backend.clone(), models(&["a", "b", "c"]));

        let err = dispatcher.dispatch(&spec(), &question()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Exhausted { .. }));
        assert_eq!(err.attempts().len(), 3);
        assert!(err
            .attempts()
            .iter()
            .all(|a| a.outcome == AttemptOutcome::RetryableFailure));
        assert_eq!(backend.calls(), vec!["a", "b", "c"]);
        assert!(err.to_string().contains("try again later"));
    }

    #[tokio::test]
    async fn fatal_failure_stops_immediately_with_original_error() {
        let original = AiError::api(400, "invalid argument");
        let backend = Arc::new(
            ScriptedBackend::new()
                .on_error("a", AiError::api(429, "rate limited"))
                .on_error("b", original.clone())
                .on_success("c", OK),
        );
        let dispatcher = Dispatcher::new(backend.clone(), models(&["a", "b", "c"]));

        let err = dispatcher.dispatch(&spec(), &question()).await.unwrap_err();

        match &err {
            DispatchError::Fatal { source, attempts } => {
                assert_eq!(source, &original);
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[1].outcome, AttemptOutcome::FatalFailure);
            }
            other => panic!("expected fatal error, got {other:?}"),
        }
        assert_eq!(backend.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fatal_on_first_attempt_makes_one_attempt() {
        let backend = Arc::new(
            ScriptedBackend::new().on_error("a", AiError::Parse("garbled body".into())),
        );
        let dispatcher = Dispatcher::new(backend.clone(), models(&["a", "b"]));

        let err = dispatcher.dispatch(&spec(), &question()).await.unwrap_err();

        assert_eq!(err.attempts().len(), 1);
        assert_eq!(backend.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn empty_model_list_is_immediate_exhaustion() {
        let backend = Arc::new(ScriptedBackend::new());
        let dispatcher = Dispatcher::new(backend.clone(), Vec::new());

        let err = dispatcher.dispatch(&spec(), &question()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Exhausted { ref attempts } if attempts.is_empty()));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn rotation_continues_across_calls() {
        // A fails (429), B succeeds; the next call starts at C.
        let backend = Arc::new(
            ScriptedBackend::new()
                .on_error("A", AiError::api(429, "rate limited"))
                .on_success("B", OK)
                .on_success("C", OK),
        );
        let dispatcher = Dispatcher::new(backend.clone(), models(&["A", "B", "C"]));

        let first = dispatcher.dispatch(&spec(), &question()).await.unwrap();
        assert_eq!(first.attempts.len(), 2);
        assert_eq!(first.model, "B");

        let second = dispatcher
            .dispatch(&spec(), &Question { text: "Another one".into() })
            .await
            .unwrap();
        assert_eq!(second.model, "C");
        assert_eq!(second.attempts.len(), 1);
    }

    #[tokio::test]
    async fn consecutive_successes_walk_the_model_list() {
        let names = models(&["x", "y", "z"]);
        let mut backend = ScriptedBackend::new();
        for name in &names {
            backend = backend.on_success(name, OK).on_success(name, OK);
        }
        let backend = Arc::new(backend);
        let dispatcher = Dispatcher::new(backend.clone(), names.clone())
            .with_rotation(Arc::new(ModelRotation::starting_at(4)));

        let mut chosen = Vec::new();
        for _ in 0..4 {
            chosen.push(dispatcher.dispatch(&spec(), &question()).await.unwrap().model);
        }

        // Global indices 4..8 map to 4 % 3 = 1 onwards.
        assert_eq!(chosen, vec!["y", "z", "x", "y"]);
    }

    #[tokio::test]
    async fn shared_rotation_balances_across_dispatchers() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .on_success("a", OK)
                .on_success("b", OK),
        );
        let rotation = Arc::new(ModelRotation::new());
        let first = Dispatcher::new(backend.clone(), models(&["a", "b"]))
            .with_rotation(rotation.clone());
        let second = Dispatcher::new(backend.clone(), models(&["a", "b"]))
            .with_rotation(rotation.clone());

        assert_eq!(first.dispatch(&spec(), &question()).await.unwrap().model, "a");
        assert_eq!(second.dispatch(&spec(), &question()).await.unwrap().model, "b");
        assert_eq!(rotation.current(), 2);
    }

    #[tokio::test]
    async fn schema_mismatch_is_fatal() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .on_success("a", r#"{"unexpected": true}"#)
                .on_success("b", OK),
        );
        let dispatcher = Dispatcher::new(backend.clone(), models(&["a", "b"]));

        let err = dispatcher.dispatch(&spec(), &question()).await.unwrap_err();

        assert!(matches!(err, DispatchError::InvalidOutput { ref model, .. } if model == "a"));
        assert_eq!(backend.calls(), vec!["a"]);
    }

    #[tokio::test]
    async fn accepts_fenced_json() {
        let backend = Arc::new(
            ScriptedBackend::new().on_success("a", "```json\n{\"answer\":\"fenced\"}\n```"),
        );
        let dispatcher = Dispatcher::new(backend, models(&["a"]));

        let result = dispatcher.dispatch(&spec(), &question()).await.unwrap();
        assert_eq!(result.output.answer, "fenced");
    }

    #[tokio::test]
    async fn backend_sees_rendered_prompt() {
        let backend = Arc::new(ScriptedBackend::new().on_success("a", OK));
        let dispatcher = Dispatcher::new(backend.clone(), models(&["a"]));

        dispatcher.dispatch(&spec(), &question()).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "Answer this: What is a stream?");
        assert_eq!(requests[0].name, "qa");
    }
}
