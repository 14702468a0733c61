//! API Models
//!
//! Request and response bodies for the HTTP surface, annotated for OpenAPI
//! generation with `utoipa`. Plan content comes straight from the core types
//! and is documented as free-form objects.

use chrono::{DateTime, Utc};
use kidplan_core::matcher::{SelectedTopic, SelectionReport};
use kidplan_core::planner::{Confidence, PlanOutput, WeekTheme};
use kidplan_core::profile::Profile;
use kidplan_core::reviewer::ReviewAnnotation;
use kidplan_core::scheduler::WeeklyPlan;
use kidplan_core::theme::ThemeWeek;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Recognized profile keys. Every field is optional and unknown keys are
/// ignored; the handler accepts any JSON object.
#[derive(Deserialize, ToSchema)]
pub struct PlanRequest {
    #[schema(example = "Maya")]
    pub child_name: Option<String>,
    #[schema(example = 7)]
    pub child_age: Option<u32>,
    #[schema(example = json!(["AI", "Space"]))]
    pub interests: Option<Vec<String>>,
    #[schema(example = "visual")]
    pub preferred_learning_style: Option<String>,
    #[schema(example = "hybrid")]
    pub plan_type: Option<String>,
    pub completed_topics: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[schema(value_type = String, format = Uuid)]
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub profile: Profile,
    #[schema(value_type = Object)]
    pub weekly_plan: WeeklyPlan,
    #[schema(value_type = Vec<Object>)]
    pub week_themes: Vec<WeekTheme>,
    #[schema(value_type = Vec<Object>)]
    pub matched_topics: Vec<SelectedTopic>,
    #[schema(value_type = Object)]
    pub review_insights: ReviewAnnotation,
    #[schema(value_type = Object)]
    pub selection: SelectionReport,
    #[schema(value_type = String, example = "normal")]
    pub confidence: Confidence,
}

impl PlanResponse {
    pub fn new(request_id: Uuid, output: PlanOutput) -> Self {
        Self {
            request_id,
            generated_at: Utc::now(),
            profile: output.profile,
            weekly_plan: output.weekly_plan,
            week_themes: output.week_themes,
            matched_topics: output.matched_topics,
            review_insights: output.review_insights,
            selection: output.selection,
            confidence: output.confidence,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub week: usize,
    pub name: String,
    pub goal: String,
    pub target_niches: Vec<String>,
}

impl ThemeSummary {
    pub fn new(week: usize, theme: &ThemeWeek) -> Self {
        Self {
            week,
            name: theme.name.to_string(),
            goal: theme.goal.to_string(),
            target_niches: theme.target_niches.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub catalog_topics: usize,
    #[schema(example = "OpenAI")]
    pub provider: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
