//! Prompt templates for the text generator.
//!
//! Templates use `{placeholder}` markers. Built-in defaults are always
//! available; a prompts directory may override them with `activity_prompt.md`
//! and `review_prompt.md`.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

pub const ACTIVITY_PROMPT_KEY: &str = "activity_prompt";
pub const REVIEW_PROMPT_KEY: &str = "review_prompt";

const DEFAULT_ACTIVITY_PROMPT: &str = r#"Design one learning activity for {child_name}, age {age}.
Learning style: {learning_style}. Plan type: {plan_type}. Interests: {interests}.

This is week {week_number}, themed "{theme}" (goal: {theme_goal}). Today is {weekday}.
Topic: {topic} (niche: {niche}).
Objective: {objective}
Suggested duration: {duration}

Reply with only a JSON object of the form:
{"activity": "<two or three sentences describing what the child does>", "materials": ["<item>", "..."]}"#;

const DEFAULT_REVIEW_PROMPT: &str = r#"Review this four-week learning plan for {child_name}, age {age}, who learns best in a {learning_style} way and is interested in {interests}.

{plan_summary}

Reply with only a JSON object matching this JSON schema:
{schema}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub activity: String,
    pub review: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            activity: DEFAULT_ACTIVITY_PROMPT.to_string(),
            review: DEFAULT_REVIEW_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Overrides the defaults with any recognized keys from `prompts`.
    pub fn from_map(mut prompts: HashMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            activity: prompts.remove(ACTIVITY_PROMPT_KEY).unwrap_or(defaults.activity),
            review: prompts.remove(REVIEW_PROMPT_KEY).unwrap_or(defaults.review),
        }
    }

    /// Loads `*.md` templates from a directory, keyed by file stem.
    pub fn from_dir(prompts_path: &Path) -> Result<Self> {
        let mut prompts = HashMap::new();
        for entry in std::fs::read_dir(prompts_path)
            .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
                let prompt_key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("Could not get file stem")?
                    .to_string();
                let content = std::fs::read_to_string(&path)?;
                prompts.insert(prompt_key, content);
            }
        }
        info!(path = %prompts_path.display(), count = prompts.len(), "Prompt templates loaded");
        Ok(Self::from_map(prompts))
    }

    /// Like [`PromptTemplates::from_dir`], but a missing or unreadable
    /// directory yields the built-in templates.
    pub fn from_dir_or_default(prompts_path: &Path) -> Self {
        match Self::from_dir(prompts_path) {
            Ok(templates) => templates,
            Err(e) => {
                warn!(error = %e, "Using built-in prompt templates");
                Self::default()
            }
        }
    }
}

/// Substitutes every `{key}` in `template` with its value in a single pass.
///
/// Substituted values are never scanned again. Braces that do not enclose a
/// known key are copied through unchanged.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
