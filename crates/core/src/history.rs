//! Completed-topic history lookup.
//!
//! The matcher asks a [`HistorySource`] which topics a child has already done,
//! on top of whatever the profile itself lists. Lookups are deterministic.

use crate::profile::Profile;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Supplies the set of topic names a child has already completed.
pub trait HistorySource: Send + Sync {
    fn completed_topics(&self, profile: &Profile) -> BTreeSet<String>;
}

/// A history source that knows nothing; only the profile's own list applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl HistorySource for NoHistory {
    fn completed_topics(&self, _profile: &Profile) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// An in-memory history keyed by child name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    by_child: HashMap<String, BTreeSet<String>>,
}

impl StaticHistory {
    pub fn new(entries: HashMap<String, Vec<String>>) -> Self {
        let by_child = entries
            .into_iter()
            .map(|(child, topics)| (child.to_lowercase(), topics.into_iter().collect()))
            .collect();
        Self { by_child }
    }

    /// Loads a JSON object mapping child names to arrays of topic names.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history file {}", path.display()))?;
        let entries: HashMap<String, Vec<String>> =
            serde_json::from_str(&raw).context("History file must map child names to topic lists")?;
        Ok(Self::new(entries))
    }
}

impl HistorySource for StaticHistory {
    fn completed_topics(&self, profile: &Profile) -> BTreeSet<String> {
        self.by_child
            .get(&profile.child_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}
