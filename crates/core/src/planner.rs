//! Learning Plan Pipeline
//!
//! Wires the stages together: profile normalization, topic matching, weekly
//! scheduling and review. Stages run strictly one after another; none of them
//! can fail, so the only error a caller sees is malformed profile input.

use crate::catalog::Catalog;
use crate::history::HistorySource;
use crate::llm_client::TextGenerator;
use crate::matcher::{Matcher, SelectedTopic, SelectionReport};
use crate::profile::{Profile, ProfileError};
use crate::prompts::PromptTemplates;
use crate::reviewer::{ReviewAnnotation, Reviewer};
use crate::scheduler::{Scheduler, WeeklyPlan};
use crate::theme::ThemeWeek;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// How much a caller should trust the plan's topic content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Normal,
    /// The selection came up short, so the plan leans on repeats or
    /// reflection days.
    Low,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTheme {
    pub week: usize,
    #[serde(flatten)]
    pub theme: ThemeWeek,
}

/// The complete result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutput {
    pub profile: Profile,
    pub weekly_plan: WeeklyPlan,
    pub week_themes: Vec<WeekTheme>,
    pub matched_topics: Vec<SelectedTopic>,
    pub review_insights: ReviewAnnotation,
    pub selection: SelectionReport,
    pub confidence: Confidence,
}

pub struct Planner {
    catalog: Arc<Catalog>,
    matcher: Matcher,
    scheduler: Scheduler,
    reviewer: Reviewer,
}

impl Planner {
    /// Builds the pipeline around a shared catalog and text generator.
    ///
    /// `timeout` bounds each individual generator call.
    pub fn new(
        catalog: Arc<Catalog>,
        history: Arc<dyn HistorySource>,
        generator: Arc<dyn TextGenerator>,
        templates: PromptTemplates,
        timeout: Duration,
    ) -> Self {
        let templates = Arc::new(templates);
        Self {
            matcher: Matcher::new(catalog.clone(), history),
            scheduler: Scheduler::new(catalog.clone(), generator.clone(), templates.clone(), timeout),
            reviewer: Reviewer::new(generator, templates, timeout),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Normalizes loosely-typed input, then runs the pipeline.
    pub async fn plan_from_input(&self, input: &Value) -> Result<PlanOutput, ProfileError> {
        let profile = Profile::from_input(input)?;
        Ok(self.plan(&profile).await)
    }

    #[instrument(name = "plan", skip_all, fields(child = %profile.child_name))]
    pub async fn plan(&self, profile: &Profile) -> PlanOutput {
        let selection = self.matcher.match_topics(profile);
        let weekly_plan = self.scheduler.schedule(profile, &selection).await;
        let reviewed = self.reviewer.review(weekly_plan, profile).await;

        let confidence = if selection.report.quota_met {
            Confidence::Normal
        } else {
            Confidence::Low
        };
        let week_themes = reviewed
            .plan
            .weeks
            .iter()
            .map(|w| WeekTheme {
                week: w.number,
                theme: w.theme,
            })
            .collect();
        info!(
            ?confidence,
            generated = reviewed.plan.llm_activity_count(),
            "Plan ready"
        );

        PlanOutput {
            profile: profile.clone(),
            weekly_plan: reviewed.plan,
            week_themes,
            matched_topics: selection.topics,
            review_insights: reviewed.annotation,
            selection: selection.report,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NoHistory;
    use crate::llm_client::{CallFailure, DisabledGenerator, MockTextGenerator};
    use crate::matcher::QUOTA;
    use crate::topic::{AgeRange, Topic};
    use serde_json::json;
    use std::collections::HashSet;

    fn catalog() -> Arc<Catalog> {
        let niches = ["AI & Robotics", "Science", "Art", "Music", "Math", "Nature"];
        let topics = (0..60)
            .map(|i| {
                let niche = niches[i % niches.len()];
                Topic::new(format!("{niche} #{i}"), niche, AgeRange::new(4, 10))
            })
            .collect();
        Arc::new(Catalog::new(topics))
    }

    fn planner(catalog: Arc<Catalog>, generator: Arc<dyn TextGenerator>) -> Planner {
        Planner::new(
            catalog,
            Arc::new(NoHistory),
            generator,
            PromptTemplates::default(),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_full_pipeline_with_failing_service() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(QUOTA + 1)
            .returning(|_| Err(CallFailure::Unavailable("503".to_string())));

        let output = planner(catalog(), Arc::new(mock))
            .plan_from_input(&json!({"child_name": "Ada", "child_age": 7, "interests": ["robot"]}))
            .await
            .unwrap();

        assert_eq!(output.matched_topics.len(), QUOTA);
        assert_eq!(output.confidence, Confidence::Normal);
        assert_eq!(output.weekly_plan.slots().count(), 28);
        assert!(output.weekly_plan.slots().all(|s| !s.llm_used));
        assert!(!output.review_insights.llm_used);
        for week in &output.weekly_plan.weeks {
            let names: HashSet<&str> = week.days.iter().map(|d| d.topic_name.as_str()).collect();
            assert_eq!(names.len(), 7);
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_is_low_confidence() {
        let output = planner(Arc::new(Catalog::default()), Arc::new(DisabledGenerator))
            .plan(&Profile::default())
            .await;

        assert!(output.matched_topics.is_empty());
        assert_eq!(output.confidence, Confidence::Low);
        assert_eq!(output.weekly_plan.slots().count(), 28);
    }

    #[tokio::test]
    async fn test_malformed_input_is_the_only_error() {
        let result = planner(catalog(), Arc::new(DisabledGenerator))
            .plan_from_input(&json!("Ada, 7"))
            .await;
        assert!(matches!(result, Err(ProfileError::NotAnObject(_))));
    }

    #[tokio::test]
    async fn test_output_schema_keys() {
        let output = planner(catalog(), Arc::new(DisabledGenerator))
            .plan(&Profile::default())
            .await;
        let value = serde_json::to_value(&output).unwrap();

        for key in ["weeklyPlan", "matchedTopics", "reviewInsights", "weekThemes", "selection"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["confidence"], "normal");
        assert!(value["weeklyPlan"]["week_4"]["sunday"]["activityText"].is_string());
        assert_eq!(value["matchedTopics"][0]["index"], 1);
        assert_eq!(value["weekThemes"][0]["name"], "Discovery & Curiosity");
    }

    #[tokio::test]
    async fn test_disabled_service_output_is_byte_identical() {
        let planner = planner(catalog(), Arc::new(DisabledGenerator));
        let profile = Profile::default();
        let first = serde_json::to_string(&planner.plan(&profile).await).unwrap();
        let second = serde_json::to_string(&planner.plan(&profile).await).unwrap();
        assert_eq!(first, second);
    }
}
