//! Child Profile Normalization
//!
//! Turns loosely-typed key/value input (a JSON object from an HTTP body or a
//! profile file) into a typed [`Profile`]. Defaults are applied here, once, so
//! the rest of the pipeline never has to guess.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

pub const DEFAULT_CHILD_NAME: &str = "Child";
pub const DEFAULT_CHILD_AGE: u32 = 7;
pub const DEFAULT_INTEREST: &str = "AI";

/// Errors raised while reading profile input.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile input must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    #[default]
    Visual,
    Auditory,
    Kinesthetic,
    Hybrid,
}

impl LearningStyle {
    /// Parses a style name, case-insensitively. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "visual" => Some(Self::Visual),
            "auditory" => Some(Self::Auditory),
            "kinesthetic" => Some(Self::Kinesthetic),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningStyle::Visual => write!(f, "visual"),
            LearningStyle::Auditory => write!(f, "auditory"),
            LearningStyle::Kinesthetic => write!(f, "kinesthetic"),
            LearningStyle::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Whether the family wants screen-based, screen-free or mixed activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Online,
    Offline,
    #[default]
    Hybrid,
}

impl PlanType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Online => write!(f, "online"),
            PlanType::Offline => write!(f, "offline"),
            PlanType::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// The normalized child profile. Immutable for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub child_name: String,
    pub age: u32,
    pub interests: BTreeSet<String>,
    pub learning_style: LearningStyle,
    pub plan_type: PlanType,
    pub completed_topics: BTreeSet<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            child_name: DEFAULT_CHILD_NAME.to_string(),
            age: DEFAULT_CHILD_AGE,
            interests: BTreeSet::from([DEFAULT_INTEREST.to_string()]),
            learning_style: LearningStyle::default(),
            plan_type: PlanType::default(),
            completed_topics: BTreeSet::new(),
        }
    }
}

impl Profile {
    /// Builds a profile from arbitrary key/value input.
    ///
    /// Recognized keys are `child_name`, `child_age`, `interests`,
    /// `preferred_learning_style`, `plan_type` and `completed_topics`. Anything
    /// else is ignored; missing or unusable values fall back to the defaults.
    pub fn from_input(input: &Value) -> Result<Self, ProfileError> {
        let map = input
            .as_object()
            .ok_or_else(|| ProfileError::NotAnObject(json_kind(input)))?;
        let defaults = Profile::default();

        let child_name = map
            .get("child_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.child_name);

        let age = map
            .get("child_age")
            .and_then(parse_age)
            .unwrap_or(defaults.age);

        let interests = map
            .get("interests")
            .map(string_set)
            .filter(|set| !set.is_empty())
            .unwrap_or(defaults.interests);

        let learning_style = map
            .get("preferred_learning_style")
            .and_then(Value::as_str)
            .and_then(LearningStyle::parse)
            .unwrap_or(defaults.learning_style);

        let plan_type = map
            .get("plan_type")
            .and_then(Value::as_str)
            .and_then(PlanType::parse)
            .unwrap_or(defaults.plan_type);

        let completed_topics = map
            .get("completed_topics")
            .map(string_set)
            .unwrap_or_default();

        let profile = Self {
            child_name,
            age,
            interests,
            learning_style,
            plan_type,
            completed_topics,
        };
        debug!(child = %profile.child_name, age = profile.age, "Normalized profile input");
        Ok(profile)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_age(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Accepts either an array of strings or a comma-separated string.
fn string_set(value: &Value) -> BTreeSet<String> {
    let items: Vec<&str> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(s) => s.split(',').collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
