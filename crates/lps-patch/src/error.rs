//! Field-level validation errors

/// One problem found in a patch
///
/// Display strings name the offending key or field so they can be returned
/// to the caller as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    /// The patch itself is not a JSON object
    #[error("patch must be an object")]
    NotAnObject,

    /// Top-level key outside the whitelist
    #[error("top-level key not allowed: {0}")]
    UnknownKey(String),

    /// Section present but not an object
    #[error("{field} must be an object")]
    ExpectedObject {
        /// Dotted field path
        field: &'static str,
    },

    /// Field present but not an array
    #[error("{field} must be an array")]
    ExpectedArray {
        /// Dotted field path
        field: &'static str,
    },

    /// Field present but not a key → value mapping
    #[error("{field} must be an object mapping")]
    ExpectedMapping {
        /// Dotted field path
        field: &'static str,
    },

    /// Skill level outside Beginner / Intermediate / Advanced
    #[error("invalid skill level for '{skill}': {level}")]
    InvalidSkillLevel {
        /// Skill name
        skill: String,
        /// Offending value, as text
        level: String,
    },

    /// Module index is not a finite number >= 0
    #[error("learning_profile.current_focus.module must be a number >= 0 (got {0})")]
    InvalidModule(String),

    /// Progress score is not a finite number
    #[error("invalid progress score for '{key}': {value}")]
    InvalidScore {
        /// Score key
        key: String,
        /// Offending value, as text
        value: String,
    },
}

impl PatchError {
    /// Dotted path of the field this error is about, when it has one
    #[must_use]
    pub fn field(&self) -> Option<String> {
        match self {
            PatchError::NotAnObject => None,
            PatchError::UnknownKey(key) => Some(key.clone()),
            PatchError::ExpectedObject { field }
            | PatchError::ExpectedArray { field }
            | PatchError::ExpectedMapping { field } => Some((*field).to_string()),
            PatchError::InvalidSkillLevel { skill, .. } => {
                Some(format!("learning_profile.skills.{skill}"))
            }
            PatchError::InvalidModule(_) => Some("learning_profile.current_focus.module".into()),
            PatchError::InvalidScore { key, .. } => {
                Some(format!("learning_profile.progress_score.{key}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            PatchError::UnknownKey("hacked_field".into()).to_string(),
            "top-level key not allowed: hacked_field"
        );
        assert_eq!(
            PatchError::ExpectedArray { field: "platform_data.active_courses" }.to_string(),
            "platform_data.active_courses must be an array"
        );
        let skill = PatchError::InvalidSkillLevel {
            skill: "X".into(),
            level: "Expert".into(),
        };
        assert_eq!(skill.to_string(), "invalid skill level for 'X': Expert");
        assert_eq!(skill.field().as_deref(), Some("learning_profile.skills.X"));
    }
}
