use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// An inclusive `[min, max]` age window, written as a two-element array in
/// catalog files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self::from((min, max))
    }

    pub fn contains(&self, age: u32) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

impl From<(u32, u32)> for AgeRange {
    fn from((a, b): (u32, u32)) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

impl From<AgeRange> for (u32, u32) {
    fn from(range: AgeRange) -> Self {
        (range.min, range.max)
    }
}

/// Coarse age buckets used by catalog entries that carry no explicit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(alias = "infant")]
    Infant,
    #[serde(alias = "toddler")]
    Toddler,
    #[serde(alias = "children", alias = "Child", alias = "child")]
    Children,
    #[serde(rename = "Pre-Teen", alias = "PreTeen", alias = "Pre-teen", alias = "preteen")]
    PreTeen,
}

impl AgeGroup {
    /// All buckets, youngest first.
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Infant,
        AgeGroup::Toddler,
        AgeGroup::Children,
        AgeGroup::PreTeen,
    ];

    pub fn years(self) -> RangeInclusive<u32> {
        match self {
            AgeGroup::Infant => 0..=1,
            AgeGroup::Toddler => 2..=4,
            AgeGroup::Children => 5..=8,
            AgeGroup::PreTeen => 9..=12,
        }
    }

    /// The bucket whose years contain `age`, if any.
    pub fn for_age(age: u32) -> Option<AgeGroup> {
        Self::ALL.into_iter().find(|g| g.years().contains(&age))
    }

    /// Buckets a child of `age` may draw topics from.
    ///
    /// The exact bucket always qualifies. An age sitting on the first or last
    /// year of its bucket also qualifies for the neighbouring bucket on that
    /// side, so an 8-year-old sees Pre-Teen topics and a 5-year-old sees
    /// Toddler topics. Ages beyond every bucket map to the nearest one.
    pub fn accepted_for_age(age: u32) -> Vec<AgeGroup> {
        let Some(idx) = Self::ALL.iter().position(|g| g.years().contains(&age)) else {
            return vec![AgeGroup::PreTeen];
        };
        let group = Self::ALL[idx];
        let mut accepted = vec![group];
        if age == *group.years().start() && idx > 0 {
            accepted.push(Self::ALL[idx - 1]);
        }
        if age == *group.years().end() && idx + 1 < Self::ALL.len() {
            accepted.push(Self::ALL[idx + 1]);
        }
        accepted
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeGroup::Infant => write!(f, "Infant"),
            AgeGroup::Toddler => write!(f, "Toddler"),
            AgeGroup::Children => write!(f, "Children"),
            AgeGroup::PreTeen => write!(f, "Pre-Teen"),
        }
    }
}

/// A single catalog entry. Read-only once the catalog is loaded.
///
/// Only `name`, `niche` and the age fields drive selection; the rest is
/// carried through for display and for prompting the text generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    pub niche: String,
    #[serde(default, alias = "age_range", skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    #[serde(default, alias = "age_group", skip_serializing_if = "Option::is_none")]
    pub age_group: Option<AgeGroup>,
    #[serde(default)]
    pub objective: String,
    #[serde(default, alias = "estimated_time")]
    pub estimated_time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: Vec<String>,
}

impl Topic {
    /// Creates a topic with an explicit age range and empty display fields.
    pub fn new(name: impl Into<String>, niche: impl Into<String>, ages: AgeRange) -> Self {
        Self {
            name: name.into(),
            niche: niche.into(),
            age_range: Some(ages),
            age_group: None,
            objective: String::new(),
            estimated_time: String::new(),
            description: String::new(),
            materials: Vec::new(),
        }
    }

    /// Checks whether a child of `age` may be offered this topic.
    ///
    /// An explicit range wins over a bucket. Entries carrying neither are
    /// never eligible.
    pub fn is_age_eligible(&self, age: u32) -> bool {
        match (self.age_range, self.age_group) {
            (Some(range), _) => range.contains(age),
            (None, Some(group)) => AgeGroup::accepted_for_age(age).contains(&group),
            (None, None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_range_is_inclusive() {
        let topic = Topic::new("Robots", "AI & Robotics", AgeRange::new(5, 8));
        assert!(!topic.is_age_eligible(4));
        for age in 5..=8 {
            assert!(topic.is_age_eligible(age), "age {age} should be eligible");
        }
        assert!(!topic.is_age_eligible(9));
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let range: AgeRange = serde_json::from_value(json!([10, 6])).unwrap();
        assert_eq!(range, AgeRange { min: 6, max: 10 });
    }

    #[test]
    fn test_bucket_edges_reach_neighbours() {
        assert_eq!(
            AgeGroup::accepted_for_age(8),
            vec![AgeGroup::Children, AgeGroup::PreTeen]
        );
        assert_eq!(
            AgeGroup::accepted_for_age(5),
            vec![AgeGroup::Children, AgeGroup::Toddler]
        );
        assert_eq!(AgeGroup::accepted_for_age(7), vec![AgeGroup::Children]);
        assert_eq!(AgeGroup::accepted_for_age(0), vec![AgeGroup::Infant]);
    }

    #[test]
    fn test_age_beyond_buckets_maps_to_preteen() {
        assert_eq!(AgeGroup::for_age(14), None);
        assert_eq!(AgeGroup::accepted_for_age(14), vec![AgeGroup::PreTeen]);
    }

    #[test]
    fn test_group_topic_eligibility() {
        let mut topic = Topic::new("Fractions", "Math", AgeRange::new(0, 0));
        topic.age_range = None;
        topic.age_group = Some(AgeGroup::PreTeen);

        assert!(topic.is_age_eligible(8));
        assert!(!topic.is_age_eligible(7));
        assert!(topic.is_age_eligible(11));

        topic.age_group = None;
        assert!(!topic.is_age_eligible(11));
    }

    #[test]
    fn test_topic_accepts_snake_and_camel_case() {
        let snake: Topic = serde_json::from_value(json!({
            "name": "Coding with Blocks",
            "niche": "AI & Robotics",
            "age_range": [6, 10],
            "estimated_time": "30 minutes"
        }))
        .unwrap();
        let camel: Topic = serde_json::from_value(json!({
            "name": "Coding with Blocks",
            "niche": "AI & Robotics",
            "ageRange": [6, 10],
            "estimatedTime": "30 minutes"
        }))
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.age_range, Some(AgeRange::new(6, 10)));
    }

    #[test]
    fn test_age_group_names() {
        let group: AgeGroup = serde_json::from_value(json!("Pre-Teen")).unwrap();
        assert_eq!(group, AgeGroup::PreTeen);
        let group: AgeGroup = serde_json::from_value(json!("toddler")).unwrap();
        assert_eq!(group, AgeGroup::Toddler);
        assert_eq!(AgeGroup::PreTeen.to_string(), "Pre-Teen");
    }
}
