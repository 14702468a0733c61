//! Plan Review
//!
//! Adds a structured quality annotation to a finished plan. The text generator
//! is asked once for JSON matching [`ReviewInsights`]; if it is unavailable or
//! replies with anything unparseable, a canned annotation with the same shape
//! is built from the plan and profile instead. The plan itself is passed
//! through untouched.

use crate::activity::REFLECTION_NICHE;
use crate::llm_client::{CallFailure, TextGenerator, generate_with_timeout, parse_json_reply};
use crate::profile::Profile;
use crate::prompts::{PromptTemplates, render};
use crate::scheduler::WeeklyPlan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Quality notes about a plan, as shown to the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInsights {
    /// Overall plan quality from 1 (poor) to 10 (excellent).
    pub overall_score: u8,
    /// What the plan does well.
    pub strengths: Vec<String>,
    /// Concrete improvements for the family to consider.
    pub suggestions: Vec<String>,
    /// Ways to keep the child engaged.
    pub engagement_tips: Vec<String>,
    /// A short note addressed to the parent.
    pub parent_notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAnnotation {
    #[serde(flatten)]
    pub insights: ReviewInsights,
    pub llm_used: bool,
}

/// A plan together with its review. The plan is exactly what was reviewed.
#[derive(Debug, Clone)]
pub struct ReviewedPlan {
    pub plan: WeeklyPlan,
    pub annotation: ReviewAnnotation,
}

pub struct Reviewer {
    generator: Arc<dyn TextGenerator>,
    templates: Arc<PromptTemplates>,
    timeout: Duration,
}

impl Reviewer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        templates: Arc<PromptTemplates>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            templates,
            timeout,
        }
    }

    pub async fn review(&self, plan: WeeklyPlan, profile: &Profile) -> ReviewedPlan {
        let prompt = self.review_prompt(&plan, profile);
        let reply = generate_with_timeout(self.generator.as_ref(), &prompt, self.timeout)
            .await
            .and_then(|raw| parse_json_reply::<ReviewInsights>(&raw));

        let annotation = match reply {
            Ok(mut insights) => {
                insights.overall_score = insights.overall_score.clamp(1, 10);
                ReviewAnnotation {
                    insights,
                    llm_used: true,
                }
            }
            Err(failure) => {
                if failure != CallFailure::Disabled {
                    warn!(error = %failure, "Plan review failed; using canned insights");
                }
                ReviewAnnotation {
                    insights: fallback_insights(&plan, profile),
                    llm_used: false,
                }
            }
        };
        info!(child = %profile.child_name, llm_used = annotation.llm_used, "Plan reviewed");

        ReviewedPlan { plan, annotation }
    }

    fn review_prompt(&self, plan: &WeeklyPlan, profile: &Profile) -> String {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(ReviewInsights))
            .unwrap_or_else(|_| "{}".to_string());
        let interests = profile.interests.iter().cloned().collect::<Vec<_>>().join(", ");
        let age = profile.age.to_string();
        let style = profile.learning_style.to_string();
        render(
            &self.templates.review,
            &[
                ("child_name", profile.child_name.as_str()),
                ("age", age.as_str()),
                ("learning_style", style.as_str()),
                ("interests", interests.as_str()),
                ("plan_summary", plan_summary(plan).as_str()),
                ("schema", schema.as_str()),
            ],
        )
    }
}

/// One line per week listing its theme and daily topics.
pub fn plan_summary(plan: &WeeklyPlan) -> String {
    let mut out = String::new();
    for week in &plan.weeks {
        let topics: Vec<&str> = week.days.iter().map(|d| d.topic_name.as_str()).collect();
        let _ = writeln!(
            out,
            "Week {} ({}: {}): {}",
            week.number,
            week.theme.name,
            week.theme.goal,
            topics.join("; ")
        );
    }
    out
}

/// Canned insights built only from the plan and profile.
pub fn fallback_insights(plan: &WeeklyPlan, profile: &Profile) -> ReviewInsights {
    let name = &profile.child_name;
    let topical: Vec<_> = plan
        .slots()
        .filter(|s| s.niche != REFLECTION_NICHE)
        .collect();
    let distinct_topics: HashSet<&str> = topical.iter().map(|s| s.topic_name.as_str()).collect();
    let distinct_niches: HashSet<&str> = topical.iter().map(|s| s.niche.as_str()).collect();
    let reflection_days = plan.slots().count() - topical.len();

    let overall_score = match distinct_topics.len() {
        0 => 3,
        1..=13 => 6,
        14..=19 => 7,
        _ => 8,
    };

    let mut suggestions = vec![format!(
        "At the end of each week, ask {name} which activity was the favorite and revisit it."
    )];
    if reflection_days > 0 {
        suggestions.push(format!(
            "{reflection_days} days are reflection days; more catalog topics for age {} would fill them.",
            profile.age
        ));
    }

    let engagement_tips = profile
        .interests
        .iter()
        .take(3)
        .map(|interest| format!("Link activities back to {name}'s interest in {interest}."))
        .collect();

    ReviewInsights {
        overall_score,
        strengths: vec![
            format!(
                "{} different topics across {} subject areas over four themed weeks.",
                distinct_topics.len(),
                distinct_niches.len()
            ),
            format!(
                "Activities are shaped for a {} learner.",
                profile.learning_style
            ),
        ],
        suggestions,
        engagement_tips,
        parent_notes: format!(
            "This plan was prepared for {name}, age {}. Keep sessions short and follow {name}'s curiosity.",
            profile.age
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{self, DayActivity};
    use crate::llm_client::{DisabledGenerator, MockTextGenerator};
    use crate::scheduler::PlannedWeek;
    use crate::theme::{THEME_WEEKS, Weekday};
    use crate::topic::{AgeRange, Topic};
    use crate::profile::LearningStyle;

    fn sample_plan() -> WeeklyPlan {
        let weeks = THEME_WEEKS
            .iter()
            .enumerate()
            .map(|(w, theme)| {
                let days: Vec<DayActivity> = Weekday::ALL
                    .iter()
                    .enumerate()
                    .map(|(d, day)| {
                        if w == 3 && d == 6 {
                            activity::reflection(theme, *day)
                        } else {
                            let topic = Topic::new(format!("Topic {w}-{d}"), format!("Niche {d}"), AgeRange::new(5, 9));
                            activity::fallback(&topic, LearningStyle::Visual)
                        }
                    })
                    .collect();
                PlannedWeek {
                    number: w + 1,
                    theme: *theme,
                    days,
                }
            })
            .collect();
        WeeklyPlan { weeks }
    }

    fn reviewer(generator: Arc<dyn TextGenerator>) -> Reviewer {
        Reviewer::new(generator, Arc::new(PromptTemplates::default()), Duration::from_secs(1))
    }

    #[test]
    fn test_fallback_insights_reflect_plan() {
        let insights = fallback_insights(&sample_plan(), &Profile::default());
        assert_eq!(insights.overall_score, 8);
        assert!(insights.strengths[0].starts_with("27 different topics across 7 subject areas"));
        assert_eq!(insights.suggestions.len(), 2);
        assert_eq!(insights.engagement_tips, vec!["Link activities back to Child's interest in AI."]);
        assert!(insights.parent_notes.contains("age 7"));
    }

    #[test]
    fn test_summary_has_a_line_per_week() {
        let summary = plan_summary(&sample_plan());
        assert_eq!(summary.lines().count(), 4);
        assert!(summary.starts_with("Week 1 (Discovery & Curiosity"));
    }

    #[tokio::test]
    async fn test_valid_reply_is_used() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate().times(1).returning(|_| {
            Ok(r#"```json
{"overallScore": 42, "strengths": ["Varied"], "suggestions": [], "engagementTips": ["Sing"], "parentNotes": "Great plan"}
```"#
                .to_string())
        });

        let plan = sample_plan();
        let reviewed = reviewer(Arc::new(mock)).review(plan.clone(), &Profile::default()).await;

        assert!(reviewed.annotation.llm_used);
        assert_eq!(reviewed.annotation.insights.overall_score, 10);
        assert_eq!(reviewed.annotation.insights.parent_notes, "Great plan");
        assert_eq!(reviewed.plan, plan);
    }

    #[tokio::test]
    async fn test_unparseable_reply_uses_fallback() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Ok("What a lovely plan!".to_string()));

        let plan = sample_plan();
        let reviewed = reviewer(Arc::new(mock)).review(plan.clone(), &Profile::default()).await;

        assert!(!reviewed.annotation.llm_used);
        assert_eq!(reviewed.annotation.insights, fallback_insights(&plan, &Profile::default()));
        assert_eq!(reviewed.plan, plan);
    }

    #[tokio::test]
    async fn test_prompt_embeds_schema_and_plan() {
        let mut mock = MockTextGenerator::new();
        mock.expect_generate()
            .withf(|prompt: &str| prompt.contains("overallScore") && prompt.contains("Topic 0-0"))
            .times(1)
            .returning(|_| Err(CallFailure::Timeout(Duration::from_secs(1))));

        let reviewed = reviewer(Arc::new(mock)).review(sample_plan(), &Profile::default()).await;
        assert!(!reviewed.annotation.llm_used);
    }

    #[tokio::test]
    async fn test_annotation_serializes_flat() {
        let reviewed = reviewer(Arc::new(DisabledGenerator))
            .review(sample_plan(), &Profile::default())
            .await;
        let value = serde_json::to_value(&reviewed.annotation).unwrap();
        assert_eq!(value["llmUsed"], false);
        assert!(value["strengths"].is_array());
        assert!(value["parentNotes"].is_string());
    }
}
