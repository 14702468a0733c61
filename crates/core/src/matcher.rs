//! Topic Matching
//!
//! Chooses a fixed-size, niche-diverse, age-appropriate subset of the catalog
//! for one child. Matching never fails: a short or empty catalog produces a
//! short or empty [`SelectionResult`], and the accompanying
//! [`SelectionReport`] says which constraints could be met.
//!
//! The steps run in a fixed order:
//! 1. drop topics the child has already completed,
//! 2. keep topics whose age range or age group fits the child,
//! 3. tier the rest into `high` (interest matches niche) and `medium`,
//! 4. greedily take `high` topics under the niche diversity cap, then `medium`,
//! 5. cyclically backfill from the eligible set until the quota is reached.

use crate::catalog::Catalog;
use crate::history::HistorySource;
use crate::profile::Profile;
use crate::topic::Topic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Number of topics a full selection holds: four weeks of seven days.
pub const QUOTA: usize = 28;

/// Topics a single niche may contribute before the cap can apply.
pub const NICHE_DEPTH_LIMIT: usize = 4;

/// Selection size below which the niche cap is not enforced.
pub const VARIETY_BASELINE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

/// A catalog topic that survived history and age filtering.
#[derive(Debug, Clone, Copy)]
pub struct EligibleTopic<'a> {
    pub topic: &'a Topic,
    pub priority: Priority,
}

/// One entry of a selection, as shown to the family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTopic {
    /// 1-based display position.
    pub index: usize,
    pub priority: Priority,
    /// True when the entry was added by cyclic backfill.
    pub backfilled: bool,
    #[serde(flatten)]
    pub topic: Topic,
}

/// Which selection constraints were satisfied for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub catalog_size: usize,
    pub excluded_by_history: usize,
    pub eligible: usize,
    pub high_priority: usize,
    pub backfilled: usize,
    pub quota: usize,
    pub quota_met: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub topics: Vec<SelectedTopic>,
    pub report: SelectionReport,
}

impl SelectionResult {
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedTopic> {
        self.topics.iter()
    }
}

/// Decides whether a niche may contribute another `high` topic.
///
/// A niche that already holds `NICHE_DEPTH_LIMIT` topics is refused only once
/// the selection has reached `VARIETY_BASELINE` entries. The thresholds are a
/// business rule carried over as-is.
pub fn niche_has_room(niche_count: usize, selected_len: usize) -> bool {
    niche_count < NICHE_DEPTH_LIMIT || selected_len < VARIETY_BASELINE
}

/// `High` when any interest is a case-insensitive substring of the niche.
pub fn priority_for(profile: &Profile, topic: &Topic) -> Priority {
    let niche = topic.niche.to_lowercase();
    let matched = profile
        .interests
        .iter()
        .map(|interest| interest.trim().to_lowercase())
        .any(|interest| !interest.is_empty() && niche.contains(&interest));
    if matched { Priority::High } else { Priority::Medium }
}

/// Applies history exclusion and age eligibility, in catalog order.
pub fn eligible_topics<'a>(
    profile: &Profile,
    topics: &'a [Topic],
    completed: &BTreeSet<String>,
) -> Vec<EligibleTopic<'a>> {
    topics
        .iter()
        .filter(|topic| !completed.contains(&topic.name))
        .filter(|topic| topic.is_age_eligible(profile.age))
        .map(|topic| EligibleTopic {
            topic,
            priority: priority_for(profile, topic),
        })
        .collect()
}

/// Greedy, diversity-capped selection followed by cyclic backfill.
///
/// Returns the chosen entries paired with a flag marking backfilled ones.
/// The result holds exactly `quota` entries unless `eligible` is empty.
pub fn select_diverse<'a>(
    eligible: &[EligibleTopic<'a>],
    quota: usize,
) -> Vec<(EligibleTopic<'a>, bool)> {
    let mut selected: Vec<(EligibleTopic<'a>, bool)> = Vec::with_capacity(quota);
    let mut chosen: HashSet<&str> = HashSet::new();
    let mut niche_counts: HashMap<&str, usize> = HashMap::new();

    for candidate in eligible.iter().filter(|e| e.priority == Priority::High) {
        if selected.len() >= quota {
            break;
        }
        let count = niche_counts.entry(candidate.topic.niche.as_str()).or_insert(0);
        if !niche_has_room(*count, selected.len()) {
            debug!(topic = %candidate.topic.name, niche = %candidate.topic.niche, "Niche cap reached; skipping");
            continue;
        }
        *count += 1;
        chosen.insert(candidate.topic.name.as_str());
        selected.push((*candidate, false));
    }

    for candidate in eligible.iter().filter(|e| e.priority == Priority::Medium) {
        if selected.len() >= quota {
            break;
        }
        if chosen.insert(candidate.topic.name.as_str()) {
            selected.push((*candidate, false));
        }
    }

    if selected.len() < quota && !eligible.is_empty() {
        let missing = quota - selected.len();
        selected.extend(eligible.iter().cycle().take(missing).map(|e| (*e, true)));
    }
    selected.truncate(quota);
    selected
}

/// Selects topics for a child from an injected catalog and history source.
pub struct Matcher {
    catalog: Arc<Catalog>,
    history: Arc<dyn HistorySource>,
    quota: usize,
}

impl Matcher {
    pub fn new(catalog: Arc<Catalog>, history: Arc<dyn HistorySource>) -> Self {
        Self {
            catalog,
            history,
            quota: QUOTA,
        }
    }

    /// Overrides the selection size. Mostly useful for tests.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Produces the selection for `profile`. Never fails.
    pub fn match_topics(&self, profile: &Profile) -> SelectionResult {
        let mut completed = profile.completed_topics.clone();
        completed.extend(self.history.completed_topics(profile));

        let topics = self.catalog.topics();
        let excluded_by_history = topics
            .iter()
            .filter(|t| completed.contains(&t.name))
            .count();
        let eligible = eligible_topics(profile, topics, &completed);
        let high_priority = eligible
            .iter()
            .filter(|e| e.priority == Priority::High)
            .count();

        let chosen = select_diverse(&eligible, self.quota);
        let backfilled = chosen.iter().filter(|(_, backfilled)| *backfilled).count();

        let selected: Vec<SelectedTopic> = chosen
            .into_iter()
            .enumerate()
            .map(|(i, (entry, backfilled))| SelectedTopic {
                index: i + 1,
                priority: entry.priority,
                backfilled,
                topic: entry.topic.clone(),
            })
            .collect();

        let report = SelectionReport {
            catalog_size: topics.len(),
            excluded_by_history,
            eligible: eligible.len(),
            high_priority,
            backfilled,
            quota: self.quota,
            quota_met: selected.len() == self.quota,
        };
        info!(
            child = %profile.child_name,
            age = profile.age,
            eligible = report.eligible,
            high = report.high_priority,
            backfilled = report.backfilled,
            selected = selected.len(),
            "Topic selection complete"
        );

        SelectionResult {
            topics: selected,
            report,
        }
    }
}
