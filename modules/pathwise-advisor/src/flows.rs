//! Prompt definitions for the advisor tools. Inputs and outputs travel as
//! camelCase JSON, so template placeholders use camelCase names too.

use ai_client::{AiError, PromptSpec};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const COUNSELLOR_PREAMBLE: &str = "You are Pathwise, a career guidance counsellor for \
school and college students in India. Be encouraging and concrete, name real courses, \
entrance exams and institutions where relevant, and never invent statistics. Respond \
only with JSON matching the requested schema.";

// --- Interest profile ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterestProfileInput {
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterestProfile {
    /// Two or three sentences describing the student.
    pub profile: String,
    pub top_interests: Vec<String>,
    pub suggested_fields: Vec<String>,
}

// --- Stream suggestion ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMark {
    pub subject: String,
    /// Percentage, 0-100.
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamSuggestionInput {
    /// e.g. "Class 10"
    pub class_level: String,
    pub marks: Vec<SubjectMark>,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreamSuggestion {
    pub recommended_stream: String,
    pub reasoning: String,
    pub alternatives: Vec<String>,
}

// --- Degree recommendation ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DegreeRecommendationInput {
    pub stream: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub career_goals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Degree {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DegreeRecommendation {
    pub degrees: Vec<Degree>,
}

// --- Career paths ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathsInput {
    /// A degree ("B.Sc. Physics") or an interest ("wildlife").
    pub focus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    pub title: String,
    pub description: String,
    pub skills: Vec<String>,
    pub growth_outlook: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareerPaths {
    pub paths: Vec<CareerPath>,
}

// --- Chat ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
}

// --- Career plan ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareerPlanInput {
    pub name: String,
    pub goal: String,
    /// e.g. "Class 12, Science (PCM)" or "2nd year B.Com"
    pub current_stage: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanSection {
    pub title: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CareerPlan {
    pub summary: String,
    pub sections: Vec<PlanSection>,
}

/// Every advisor prompt.
#[derive(Debug, Clone)]
pub struct Flows {
    pub interest_profile: PromptSpec<InterestProfileInput, InterestProfile>,
    pub stream_suggestion: PromptSpec<StreamSuggestionInput, StreamSuggestion>,
    pub degree_recommendation: PromptSpec<DegreeRecommendationInput, DegreeRecommendation>,
    pub career_paths: PromptSpec<CareerPathsInput, CareerPaths>,
    pub chat: PromptSpec<ChatInput, ChatReply>,
    pub career_plan: PromptSpec<CareerPlanInput, CareerPlan>,
}

impl Flows {
    pub fn new() -> Self {
        Self {
            interest_profile: PromptSpec::new(
                "interest_profile",
                "A student answered an interest questionnaire. Their answers, as JSON \
                 question/answer pairs:\n{{answers}}\n\nSummarise who they are in `profile`, \
                 list their strongest interests in `topInterests` (at most five) and the \
                 fields of study that suit them in `suggestedFields`.",
            )
            .with_preamble(COUNSELLOR_PREAMBLE),

            stream_suggestion: PromptSpec::new(
                "stream_suggestion",
                "A student in {{classLevel}} is choosing a stream (Science, Commerce, \
                 Arts/Humanities or Vocational).\nMarks by subject: {{marks}}\n\
                 Interests: {{interests}}\n\nRecommend one stream in `recommendedStream`, \
                 explain why in `reasoning`, and list other reasonable streams in \
                 `alternatives`.",
            )
            .with_preamble(COUNSELLOR_PREAMBLE),

            degree_recommendation: PromptSpec::new(
                "degree_recommendation",
                "A student in the {{stream}} stream is choosing an undergraduate degree.\n\
                 Interests: {{interests}}\nCareer goals: {{careerGoals}}\n\n\
                 Recommend three to six degrees in `degrees`, each with a one-sentence \
                 `reason`.",
            )
            .with_preamble(COUNSELLOR_PREAMBLE),

            career_paths: PromptSpec::new(
                "career_paths",
                "List four to six career paths open to someone focused on: {{focus}}\n\n\
                 For each path give a `title`, a short `description`, the key `skills` to \
                 build, and a `growthOutlook` for the Indian job market.",
            )
            .with_preamble(COUNSELLOR_PREAMBLE),

            chat: PromptSpec::new(
                "chat",
                "Conversation so far, oldest first, as JSON role/content pairs:\n\
                 {{history}}\n\nThe student now says: {{message}}\n\n\
                 Answer in `reply`. Keep it under 200 words and stay on education and \
                 careers; steer other topics back politely.",
            )
            .with_preamble(COUNSELLOR_PREAMBLE),

            career_plan: PromptSpec::new(
                "career_plan",
                "Write a personal career plan for {{name}}.\nGoal: {{goal}}\n\
                 Current stage: {{currentStage}}\nInterests: {{interests}}\n\
                 Strengths: {{strengths}}\n\nGive a short `summary`, then `sections` \
                 titled \"Education\", \"Skills\", \"Entrance exams\", \"Experience\" and \
                 \"Timeline\", each with concrete, ordered `steps`.",
            )
            .with_preamble(COUNSELLOR_PREAMBLE),
        }
    }

    /// Check every template against its input type.
    pub fn validate(&self) -> Result<(), AiError> {
        self.interest_profile.validate()?;
        self.stream_suggestion.validate()?;
        self.degree_recommendation.validate()?;
        self.career_paths.validate()?;
        self.chat.validate()?;
        self.career_plan.validate()
    }
}

impl Default for Flows {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_only_reference_input_fields() {
        Flows::new().validate().unwrap();
    }

    #[test]
    fn renders_lists_and_nested_values() {
        let flows = Flows::new();
        let request = flows
            .stream_suggestion
            .request(&StreamSuggestionInput {
                class_level: "Class 10".into(),
                marks: vec![SubjectMark {
                    subject: "Mathematics".into(),
                    score: 92,
                }],
                interests: vec!["robotics".into(), "chess".into()],
            })
            .unwrap();

        assert!(request.prompt.contains("A student in Class 10"));
        assert!(request.prompt.contains("Interests: robotics, chess"));
        assert!(request.prompt.contains(r#""subject":"Mathematics""#));
        assert!(!request.prompt.contains("{{"));
        assert_eq!(request.preamble.as_deref(), Some(COUNSELLOR_PREAMBLE));
    }

    #[test]
    fn output_schemas_use_wire_names() {
        let request = Flows::new()
            .career_paths
            .request(&CareerPathsInput {
                focus: "wildlife".into(),
            })
            .unwrap();

        let schema = serde_json::to_string(&request.output_schema).unwrap();
        assert!(schema.contains("growthOutlook"));
        assert!(!schema.contains("$ref"));
    }

    #[test]
    fn chat_history_defaults_to_empty() {
        let input: ChatInput = serde_json::from_str(r#"{"message": "Is NEET hard?"}"#).unwrap();
        assert!(input.history.is_empty());

        let request = Flows::new().chat.request(&input).unwrap();
        assert!(request.prompt.contains("The student now says: Is NEET hard?"));
    }
}
