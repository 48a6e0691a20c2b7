use std::sync::Arc;

use ai_client::{Dispatcher, OpenAi, PromptSpec, StructuredOutput};
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use pathwise_common::{Config, DocumentStore};

use crate::error::AdvisorError;
use crate::flows::*;

pub const CAREER_PLANS_COLLECTION: &str = "careerPlans";

/// A generated plan and, when a store is configured, the id it was saved under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCareerPlan {
    pub id: Option<String>,
    pub plan: CareerPlan,
}

/// The advisor tools, one method per flow, all sharing one dispatcher.
pub struct AdvisorService {
    dispatcher: Dispatcher,
    flows: Flows,
    store: Option<Arc<dyn DocumentStore>>,
}

impl AdvisorService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            flows: Flows::new(),
            store: None,
        }
    }

    /// OpenAI-compatible backend at `AI_BASE_URL`, rotating through `AI_MODELS`.
    pub fn from_config(config: &Config) -> Self {
        let backend = OpenAi::new(config.ai_api_key.as_str()).with_base_url(config.ai_base_url.as_str());
        Self::new(Dispatcher::new(Arc::new(backend), config.ai_models.clone()))
    }

    /// Persist generated career plans.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn flows(&self) -> &Flows {
        &self.flows
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn interest_profile(
        &self,
        input: &InterestProfileInput,
    ) -> Result<InterestProfile, AdvisorError> {
        if input.answers.is_empty() {
            return Err(AdvisorError::Validation("answers must not be empty".into()));
        }
        self.run(&self.flows.interest_profile, input).await
    }

    pub async fn stream_suggestion(
        &self,
        input: &StreamSuggestionInput,
    ) -> Result<StreamSuggestion, AdvisorError> {
        require("classLevel", &input.class_level)?;
        if let Some(mark) = input.marks.iter().find(|m| m.score > 100) {
            return Err(AdvisorError::Validation(format!(
                "score for {} must be between 0 and 100",
                mark.subject
            )));
        }
        self.run(&self.flows.stream_suggestion, input).await
    }

    pub async fn degree_recommendation(
        &self,
        input: &DegreeRecommendationInput,
    ) -> Result<DegreeRecommendation, AdvisorError> {
        require("stream", &input.stream)?;
        self.run(&self.flows.degree_recommendation, input).await
    }

    pub async fn career_paths(&self, input: &CareerPathsInput) -> Result<CareerPaths, AdvisorError> {
        require("focus", &input.focus)?;
        self.run(&self.flows.career_paths, input).await
    }

    pub async fn chat(&self, input: &ChatInput) -> Result<ChatReply, AdvisorError> {
        require("message", &input.message)?;
        self.run(&self.flows.chat, input).await
    }

    /// Generate a plan and save it under `careerPlans/{uuid}` when a store
    /// is configured.
    pub async fn create_career_plan(
        &self,
        input: &CareerPlanInput,
    ) -> Result<SavedCareerPlan, AdvisorError> {
        require("name", &input.name)?;
        require("goal", &input.goal)?;

        let plan = self.run(&self.flows.career_plan, input).await?;

        let Some(ref store) = self.store else {
            return Ok(SavedCareerPlan { id: None, plan });
        };

        let id = Uuid::new_v4().to_string();
        let document = json!({
            "name": input.name,
            "goal": input.goal,
            "input": input,
            "plan": plan,
            "createdAt": Utc::now().to_rfc3339(),
        });

        store
            .merge(CAREER_PLANS_COLLECTION, &id, document)
            .await
            .map_err(|e| {
                warn!(id = %id, error = %e, "Failed to save career plan");
                AdvisorError::Store(format!("{e:#}"))
            })?;

        info!(id = %id, "Career plan saved");
        Ok(SavedCareerPlan { id: Some(id), plan })
    }

    async fn run<I, O>(&self, spec: &PromptSpec<I, O>, input: &I) -> Result<O, AdvisorError>
    where
        I: Serialize + JsonSchema + Sync,
        O: StructuredOutput + Send,
    {
        let dispatched = self.dispatcher.dispatch(spec, input).await?;
        info!(
            flow = spec.name(),
            model = %dispatched.model,
            attempts = dispatched.attempts.len(),
            "Advisor flow completed"
        );
        Ok(dispatched.output)
    }
}

fn require(field: &str, value: &str) -> Result<(), AdvisorError> {
    if value.trim().is_empty() {
        return Err(AdvisorError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
