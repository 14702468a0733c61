//! Weekly Scheduling
//!
//! Spreads a [`SelectionResult`] over the fixed four-week, seven-day planning
//! horizon and turns every slot into a [`DayActivity`].
//!
//! Topic assignment is a pure step. For each theme week an ordered list of
//! [`CandidateSource`]s is consulted until the week holds seven topics; a topic
//! never appears twice in one week, and a topic is only reused in a later week
//! once every topic in the selection has been placed at least once. Slots that
//! still have no topic become reflection days.
//!
//! Activity text is then requested from the text generator slot by slot. Any
//! failure on a call falls back to a learning-style template for that slot
//! alone.

use crate::activity::{self, DayActivity, GeneratedActivity};
use crate::catalog::Catalog;
use crate::llm_client::{CallFailure, TextGenerator, generate_with_timeout, parse_json_reply};
use crate::matcher::{SelectedTopic, SelectionResult};
use crate::profile::Profile;
use crate::prompts::{PromptTemplates, render};
use crate::theme::{THEME_WEEKS, ThemeWeek, Weekday};
use crate::topic::Topic;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DAYS_PER_WEEK: usize = 7;

/// Topics taken from one preferred niche before moving to the next.
pub const PER_TARGET_NICHE: usize = 3;

/// How far into the selection last-resort reuse may reach.
pub const REUSE_WINDOW: usize = 14;

/// Candidate sources consulted, in order, when filling a week.
pub const WEEK_SOURCES: [CandidateSource; 4] = [
    CandidateSource::TargetNiches {
        per_niche: PER_TARGET_NICHE,
    },
    CandidateSource::OtherNiches,
    CandidateSource::RemainingUnused,
    CandidateSource::EarlySelection {
        window: REUSE_WINDOW,
    },
];

/// Selected topics sharing a niche, in selection order.
#[derive(Debug)]
pub struct NicheBucket<'a> {
    pub niche: &'a str,
    pub entries: Vec<&'a SelectedTopic>,
}

/// A selection grouped into niche buckets ordered by catalog appearance.
#[derive(Debug)]
pub struct TopicPool<'a> {
    selection: &'a [SelectedTopic],
    buckets: Vec<NicheBucket<'a>>,
}

impl<'a> TopicPool<'a> {
    /// Groups `selection` by niche. Niches missing from `niche_order` go last,
    /// in order of first appearance in the selection.
    pub fn new(selection: &'a [SelectedTopic], niche_order: &[&str]) -> Self {
        let mut buckets: Vec<NicheBucket<'a>> = Vec::new();
        for entry in selection {
            let niche = entry.topic.niche.as_str();
            match buckets.iter_mut().find(|b| b.niche == niche) {
                Some(bucket) => bucket.entries.push(entry),
                None => buckets.push(NicheBucket {
                    niche,
                    entries: vec![entry],
                }),
            }
        }
        buckets.sort_by_key(|b| {
            niche_order
                .iter()
                .position(|n| *n == b.niche)
                .unwrap_or(usize::MAX)
        });
        Self { selection, buckets }
    }

    pub fn buckets(&self) -> &[NicheBucket<'a>] {
        &self.buckets
    }
}

/// The topics gathered for one week so far.
#[derive(Debug, Default)]
pub struct WeekDraft<'a> {
    picks: Vec<&'a SelectedTopic>,
    names: HashSet<&'a str>,
}

impl<'a> WeekDraft<'a> {
    pub fn is_full(&self) -> bool {
        self.picks.len() >= DAYS_PER_WEEK
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Adds `entry` unless the week is full or already holds that topic name.
    pub fn push(&mut self, entry: &'a SelectedTopic) -> bool {
        if self.is_full() || !self.names.insert(entry.topic.name.as_str()) {
            return false;
        }
        self.picks.push(entry);
        true
    }

    pub fn picks(&self) -> &[&'a SelectedTopic] {
        &self.picks
    }
}

/// One strategy for finding topics for a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Unused topics from the week's preferred niches, in preference order,
    /// at most `per_niche` from each.
    TargetNiches { per_niche: usize },
    /// Unused topics from niches the week does not prefer.
    OtherNiches,
    /// Any unused topic left in any niche.
    RemainingUnused,
    /// The first `window` selection entries, even if used in earlier weeks.
    EarlySelection { window: usize },
}

impl CandidateSource {
    /// Adds this source's candidates to `week` until it is full.
    pub fn fill<'a>(
        &self,
        pool: &TopicPool<'a>,
        theme: &ThemeWeek,
        used: &HashSet<String>,
        week: &mut WeekDraft<'a>,
    ) {
        match *self {
            CandidateSource::TargetNiches { per_niche } => {
                for target in theme.target_niches {
                    let matching = pool
                        .buckets
                        .iter()
                        .filter(|b| b.niche.eq_ignore_ascii_case(target));
                    for bucket in matching {
                        let mut taken = 0;
                        for entry in &bucket.entries {
                            if taken >= per_niche || week.is_full() {
                                break;
                            }
                            if !used.contains(&entry.topic.name) && week.push(*entry) {
                                taken += 1;
                            }
                        }
                    }
                }
            }
            CandidateSource::OtherNiches => {
                let others = pool.buckets.iter().filter(|b| !theme.targets(b.niche));
                for entry in others.flat_map(|b| b.entries.iter()) {
                    if week.is_full() {
                        break;
                    }
                    if !used.contains(&entry.topic.name) {
                        week.push(*entry);
                    }
                }
            }
            CandidateSource::RemainingUnused => {
                for entry in pool.buckets.iter().flat_map(|b| b.entries.iter()) {
                    if week.is_full() {
                        break;
                    }
                    if !used.contains(&entry.topic.name) {
                        week.push(*entry);
                    }
                }
            }
            CandidateSource::EarlySelection { window } => {
                let selection: &'a [SelectedTopic] = pool.selection;
                for entry in selection.iter().take(window) {
                    if week.is_full() {
                        break;
                    }
                    week.push(entry);
                }
            }
        }
    }
}

/// Assigns up to seven topics to each theme week.
pub fn assign_weeks<'a>(pool: &TopicPool<'a>, sources: &[CandidateSource]) -> Vec<Vec<&'a SelectedTopic>> {
    let mut used: HashSet<String> = HashSet::new();
    THEME_WEEKS
        .iter()
        .map(|theme| {
            let mut week = WeekDraft::default();
            for source in sources {
                if week.is_full() {
                    break;
                }
                source.fill(pool, theme, &used, &mut week);
            }
            used.extend(week.picks().iter().map(|e| e.topic.name.clone()));
            debug!(theme = %theme.name, topics = week.picks().len(), "Week assigned");
            week.picks
        })
        .collect()
}

/// One theme week with its seven day slots, Monday first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWeek {
    pub number: usize,
    pub theme: ThemeWeek,
    pub days: Vec<DayActivity>,
}

impl Serialize for PlannedWeek {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, activity) in Weekday::ALL.iter().zip(&self.days) {
            map.serialize_entry(day.key(), activity)?;
        }
        map.end()
    }
}

/// The full planning horizon. Serializes as `{week_1: {monday: ..}, ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeeklyPlan {
    pub weeks: Vec<PlannedWeek>,
}

impl WeeklyPlan {
    pub fn slots(&self) -> impl Iterator<Item = &DayActivity> {
        self.weeks.iter().flat_map(|w| w.days.iter())
    }

    pub fn llm_activity_count(&self) -> usize {
        self.slots().filter(|s| s.llm_used).count()
    }
}

impl Serialize for WeeklyPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.weeks.len()))?;
        for week in &self.weeks {
            map.serialize_entry(&format!("week_{}", week.number), week)?;
        }
        map.end()
    }
}

/// Builds the weekly plan for a selection.
pub struct Scheduler {
    catalog: Arc<Catalog>,
    generator: Arc<dyn TextGenerator>,
    templates: Arc<PromptTemplates>,
    timeout: Duration,
}

impl Scheduler {
    pub fn new(
        catalog: Arc<Catalog>,
        generator: Arc<dyn TextGenerator>,
        templates: Arc<PromptTemplates>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            generator,
            templates,
            timeout,
        }
    }

    /// Produces a plan with exactly 28 filled slots. Never fails.
    pub async fn schedule(&self, profile: &Profile, selection: &SelectionResult) -> WeeklyPlan {
        let niche_order = self.catalog.niche_order();
        let pool = TopicPool::new(&selection.topics, &niche_order);
        let assignments = assign_weeks(&pool, &WEEK_SOURCES);

        let mut weeks = Vec::with_capacity(THEME_WEEKS.len());
        for (i, (theme, picks)) in THEME_WEEKS.iter().zip(assignments).enumerate() {
            let number = i + 1;
            let mut days = Vec::with_capacity(DAYS_PER_WEEK);
            for (slot, day) in Weekday::ALL.iter().enumerate() {
                let activity = match picks.get(slot) {
                    Some(entry) => self.activity_for(profile, theme, number, *day, &entry.topic).await,
                    None => activity::reflection(theme, *day),
                };
                days.push(activity);
            }
            weeks.push(PlannedWeek {
                number,
                theme: *theme,
                days,
            });
        }

        let plan = WeeklyPlan { weeks };
        info!(
            child = %profile.child_name,
            selected = selection.len(),
            generated = plan.llm_activity_count(),
            "Weekly plan scheduled"
        );
        plan
    }

    async fn activity_for(
        &self,
        profile: &Profile,
        theme: &ThemeWeek,
        week_number: usize,
        day: Weekday,
        topic: &Topic,
    ) -> DayActivity {
        let prompt = self.activity_prompt(profile, theme, week_number, day, topic);
        let reply = generate_with_timeout(self.generator.as_ref(), &prompt, self.timeout)
            .await
            .and_then(|raw| parse_json_reply::<GeneratedActivity>(&raw))
            .and_then(|generated| {
                if generated.activity.trim().is_empty() {
                    Err(CallFailure::Malformed("empty activity text".to_string()))
                } else {
                    Ok(generated)
                }
            });

        match reply {
            Ok(generated) => activity::from_generated(topic, profile.learning_style, generated),
            Err(CallFailure::Disabled) => activity::fallback(topic, profile.learning_style),
            Err(failure) => {
                warn!(topic = %topic.name, %day, error = %failure, "Activity generation failed; using template");
                activity::fallback(topic, profile.learning_style)
            }
        }
    }

    fn activity_prompt(
        &self,
        profile: &Profile,
        theme: &ThemeWeek,
        week_number: usize,
        day: Weekday,
        topic: &Topic,
    ) -> String {
        let interests = profile.interests.iter().cloned().collect::<Vec<_>>().join(", ");
        let age = profile.age.to_string();
        let week = week_number.to_string();
        let style = profile.learning_style.to_string();
        let plan_type = profile.plan_type.to_string();
        let weekday = day.to_string();
        let duration = if topic.estimated_time.trim().is_empty() {
            activity::DEFAULT_DURATION
        } else {
            topic.estimated_time.as_str()
        };
        render(
            &self.templates.activity,
            &[
                ("child_name", profile.child_name.as_str()),
                ("age", age.as_str()),
                ("learning_style", style.as_str()),
                ("plan_type", plan_type.as_str()),
                ("interests", interests.as_str()),
                ("week_number", week.as_str()),
                ("theme", theme.name),
                ("theme_goal", theme.goal),
                ("weekday", weekday.as_str()),
                ("topic", topic.name.as_str()),
                ("niche", topic.niche.as_str()),
                ("objective", topic.objective.as_str()),
                ("duration", duration),
            ],
        )
    }
}
