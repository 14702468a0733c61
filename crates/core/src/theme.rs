use serde::Serialize;
use std::fmt;

/// Number of themed weeks in a plan.
pub const WEEKS: usize = 4;

/// One of the fixed themed weeks of the planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeWeek {
    pub name: &'static str,
    pub goal: &'static str,
    /// Preferred niches, most preferred first. Not a hard filter.
    pub target_niches: &'static [&'static str],
}

pub const THEME_WEEKS: [ThemeWeek; WEEKS] = [
    ThemeWeek {
        name: "Discovery & Curiosity",
        goal: "Spark curiosity by exploring how the world around us works",
        target_niches: &["Science", "Nature", "AI & Robotics", "Space"],
    },
    ThemeWeek {
        name: "Creative Expression",
        goal: "Build confidence through art, music and storytelling",
        target_niches: &["Art", "Music", "Storytelling", "Language"],
    },
    ThemeWeek {
        name: "Problem Solving & Logic",
        goal: "Practice step-by-step thinking with puzzles, numbers and code",
        target_niches: &["Math", "Coding", "AI & Robotics", "Engineering"],
    },
    ThemeWeek {
        name: "Real-World Connections",
        goal: "Connect new skills to everyday life, people and places",
        target_niches: &["Life Skills", "Geography", "Social Studies", "Health"],
    },
];

impl ThemeWeek {
    /// Case-insensitive membership test against the preferred niches.
    pub fn targets(&self, niche: &str) -> bool {
        self.target_niches
            .iter()
            .any(|target| target.eq_ignore_ascii_case(niche))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key();
        let mut chars = key.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_ignores_case() {
        assert!(THEME_WEEKS[0].targets("science"));
        assert!(THEME_WEEKS[0].targets("AI & ROBOTICS"));
        assert!(!THEME_WEEKS[0].targets("Art"));
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(Weekday::ALL.len(), 7);
        assert_eq!(Weekday::Wednesday.key(), "wednesday");
        assert_eq!(Weekday::Sunday.to_string(), "Sunday");
    }
}
