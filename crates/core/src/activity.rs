//! Day activities and their deterministic fallbacks.

use crate::profile::LearningStyle;
use crate::theme::{ThemeWeek, Weekday};
use crate::topic::Topic;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION: &str = "30 minutes";
pub const REFLECTION_NICHE: &str = "Reflection";
const REFLECTION_DURATION: &str = "20 minutes";

/// A single day's slot in the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayActivity {
    pub topic_name: String,
    pub niche: String,
    pub activity_text: String,
    pub duration: String,
    pub objective: String,
    pub materials_needed: Vec<String>,
    pub llm_used: bool,
}

/// The shape requested from the text generator for an activity.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedActivity {
    pub activity: String,
    #[serde(default)]
    pub materials: Vec<String>,
}

/// Activity text used when the generator gives us nothing.
pub fn fallback_text(style: LearningStyle, topic: &str) -> String {
    match style {
        LearningStyle::Visual => format!("Visual {topic} discovery with picture cards and drawings"),
        LearningStyle::Auditory => format!("Story and song time about {topic}"),
        LearningStyle::Kinesthetic => format!("Hands-on {topic} building challenge"),
        LearningStyle::Hybrid => format!("Interactive {topic} exploration"),
    }
}

fn style_materials(style: LearningStyle) -> Vec<String> {
    let items: &[&str] = match style {
        LearningStyle::Visual => &["Picture cards", "Colored pencils", "Paper"],
        LearningStyle::Auditory => &["Storybook", "Music player"],
        LearningStyle::Kinesthetic => &["Building blocks", "Craft supplies"],
        LearningStyle::Hybrid => &["Paper", "Colored pencils", "Building blocks"],
    };
    items.iter().map(|s| s.to_string()).collect()
}

fn duration_for(topic: &Topic) -> String {
    let estimate = topic.estimated_time.trim();
    if estimate.is_empty() {
        DEFAULT_DURATION.to_string()
    } else {
        estimate.to_string()
    }
}

fn objective_for(topic: &Topic) -> String {
    let objective = topic.objective.trim();
    if objective.is_empty() {
        format!("Explore the basics of {}", topic.name)
    } else {
        objective.to_string()
    }
}

/// Builds a slot from generator output.
///
/// Materials come from the reply, then the catalog entry, then the
/// learning-style defaults.
pub fn from_generated(topic: &Topic, style: LearningStyle, generated: GeneratedActivity) -> DayActivity {
    let materials: Vec<String> = generated
        .materials
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    let materials_needed = if !materials.is_empty() {
        materials
    } else if !topic.materials.is_empty() {
        topic.materials.clone()
    } else {
        style_materials(style)
    };
    DayActivity {
        topic_name: topic.name.clone(),
        niche: topic.niche.clone(),
        activity_text: generated.activity.trim().to_string(),
        duration: duration_for(topic),
        objective: objective_for(topic),
        materials_needed,
        llm_used: true,
    }
}

/// Builds a slot from the per-learning-style template.
pub fn fallback(topic: &Topic, style: LearningStyle) -> DayActivity {
    let materials_needed = if topic.materials.is_empty() {
        style_materials(style)
    } else {
        topic.materials.clone()
    };
    DayActivity {
        topic_name: topic.name.clone(),
        niche: topic.niche.clone(),
        activity_text: fallback_text(style, &topic.name),
        duration: duration_for(topic),
        objective: objective_for(topic),
        materials_needed,
        llm_used: false,
    }
}

/// Fills a slot that received no topic. The weekday keeps the name unique
/// within the week.
pub fn reflection(theme: &ThemeWeek, day: Weekday) -> DayActivity {
    DayActivity {
        topic_name: format!("{} Reflection ({day})", theme.name),
        niche: REFLECTION_NICHE.to_string(),
        activity_text: format!(
            "Look back on this week's \"{}\" adventures: draw, tell or act out a favorite moment and talk about how it connects to the goal: {}.",
            theme.name, theme.goal
        ),
        duration: REFLECTION_DURATION.to_string(),
        objective: format!("Consolidate what was learned during {}", theme.name),
        materials_needed: vec!["Journal".to_string(), "Crayons".to_string()],
        llm_used: false,
    }
}
