//! Skill levels

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Proficiency recorded for one skill
///
/// Serialized in Title Case (`"Beginner"`, `"Intermediate"`, `"Advanced"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    /// Just started
    Beginner,
    /// Working knowledge
    Intermediate,
    /// Can teach it
    Advanced,
}

impl SkillLevel {
    /// All levels, lowest first
    pub const ALL: [SkillLevel; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    /// Match a level name case-insensitively
    #[must_use]
    pub fn parse_loose(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(raw))
    }

    /// Canonical Title Case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
        }
    }
}

impl Display for SkillLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(SkillLevel::parse_loose("ADVANCED"), Some(SkillLevel::Advanced));
        assert_eq!(SkillLevel::parse_loose("beginner"), Some(SkillLevel::Beginner));
        assert_eq!(
            SkillLevel::parse_loose("InTeRmEdIaTe"),
            Some(SkillLevel::Intermediate)
        );
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(SkillLevel::parse_loose("Expert"), None);
        assert_eq!(SkillLevel::parse_loose(" advanced"), None);
        assert_eq!(SkillLevel::parse_loose(""), None);
    }

    #[test]
    fn serializes_title_case() {
        let json = serde_json::to_string(&SkillLevel::Intermediate).unwrap();
        assert_eq!(json, "\"Intermediate\"");
    }
}
