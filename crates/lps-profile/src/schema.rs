//! Container schema of the profile document
//!
//! [`SCHEMA`] lists every container path together with the JSON kind it
//! must hold. It drives two things:
//!
//! - [`repair`]: before a stored document is deserialized, any container
//!   whose type drifted is reset to an empty container of the right kind.
//!   Only the drifted branch is lost; siblings are untouched.
//! - the merge rules in `lps-merge`, which are checked against this table.
//!
//! [`audit`] is an advisory whole-document check used before a profile is
//! handed to the model.

use crate::model::Profile;
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// JSON kind a container path must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Fixed-shape section with known keys
    Object,
    /// Ordered list
    List,
    /// Open-keyed mapping
    Map,
}

impl FieldKind {
    /// Whether `value` has this kind
    #[inline]
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            FieldKind::Object | FieldKind::Map => value.is_object(),
            FieldKind::List => value.is_array(),
        }
    }

    /// Empty container of this kind
    #[inline]
    #[must_use]
    pub fn empty(&self) -> Value {
        match self {
            FieldKind::Object | FieldKind::Map => Value::Object(Map::new()),
            FieldKind::List => Value::Array(Vec::new()),
        }
    }
}

/// Container paths, parents before children
pub const SCHEMA: &[(&str, FieldKind)] = &[
    ("platform_data", FieldKind::Object),
    ("platform_data.active_courses", FieldKind::List),
    ("platform_data.course_progress", FieldKind::Map),
    ("learning_profile", FieldKind::Object),
    ("learning_profile.goals", FieldKind::List),
    ("learning_profile.skills", FieldKind::Map),
    ("learning_profile.weaknesses", FieldKind::List),
    ("learning_profile.strengths", FieldKind::List),
    ("learning_profile.current_focus", FieldKind::Object),
    ("learning_profile.progress_score", FieldKind::Map),
    ("learning_profile.history", FieldKind::List),
    ("roadmap_progress", FieldKind::Object),
    ("roadmap_progress.skills_status", FieldKind::Map),
    ("roadmap_progress.subskills", FieldKind::List),
];

/// Kind declared for `path`, if it is a container
#[must_use]
pub fn kind_of(path: &str) -> Option<FieldKind> {
    SCHEMA
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, kind)| *kind)
}

/// One container reset performed by [`repair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairAction {
    /// Dotted path of the reset container
    pub path: &'static str,
    /// Kind the path requires
    pub expected: FieldKind,
    /// JSON type that was found
    pub found: &'static str,
}

/// Reset drifted containers in a stored document
///
/// `null` counts as drift. Missing containers are left missing; typed
/// deserialization fills in defaults for them.
pub fn repair(document: &mut Value) -> Vec<RepairAction> {
    let mut actions = Vec::new();

    for &(path, expected) in SCHEMA {
        let Some((parent_path, key)) = split_parent(path) else {
            continue;
        };
        let parent = match parent_path {
            Some(pp) => document.pointer_mut(&pointer(pp)),
            None => Some(&mut *document),
        };
        let Some(Value::Object(parent)) = parent else {
            continue;
        };
        let Some(slot) = parent.get_mut(key) else {
            continue;
        };

        if !expected.admits(slot) {
            tracing::warn!(
                "Resetting drifted container '{}': expected {:?}, found {}",
                path,
                expected,
                json_type(slot)
            );
            actions.push(RepairAction {
                path,
                expected,
                found: json_type(slot),
            });
            *slot = expected.empty();
        }
    }

    actions
}

fn split_parent(path: &str) -> Option<(Option<&str>, &str)> {
    match path.rsplit_once('.') {
        Some((parent, key)) => Some((Some(parent), key)),
        None if !path.is_empty() => Some((None, path)),
        None => None,
    }
}

fn pointer(dotted: &str) -> String {
    format!("/{}", dotted.replace('.', "/"))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Advisory finding from [`audit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// A required text field is blank
    MissingField(&'static str),
}

impl Display for SchemaViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::MissingField(field) => write!(f, "{field} is required"),
        }
    }
}

/// Check the fields a complete profile is expected to carry
#[must_use]
pub fn audit(profile: &Profile) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if profile.user_id.as_str().is_empty() {
        violations.push(SchemaViolation::MissingField("user_id"));
    }
    if profile.platform_data.name.trim().is_empty() {
        violations.push(SchemaViolation::MissingField("platform_data.name"));
    }
    if profile.platform_data.email.trim().is_empty() {
        violations.push(SchemaViolation::MissingField("platform_data.email"));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Profile, UserId};
    use serde_json::json;

    #[test]
    fn repair_resets_only_drifted_branch() {
        let mut doc = json!({
            "user_id": "u1",
            "platform_data": {"name": "Ana", "active_courses": "A", "course_progress": []},
            "learning_profile": {"goals": ["g"], "skills": ["x"], "current_focus": null},
            "roadmap_progress": {"subskills": {}, "job_role": "Backend"}
        });

        let actions = repair(&mut doc);
        let paths: Vec<_> = actions.iter().map(|a| a.path).collect();
        assert_eq!(
            paths,
            vec![
                "platform_data.active_courses",
                "platform_data.course_progress",
                "learning_profile.skills",
                "learning_profile.current_focus",
                "roadmap_progress.subskills",
            ]
        );

        assert_eq!(doc["platform_data"]["name"], "Ana");
        assert_eq!(doc["platform_data"]["active_courses"], json!([]));
        assert_eq!(doc["learning_profile"]["goals"], json!(["g"]));
        assert_eq!(doc["learning_profile"]["current_focus"], json!({}));
        assert_eq!(doc["roadmap_progress"]["job_role"], "Backend");

        let profile: Profile = serde_json::from_value(doc).unwrap();
        assert_eq!(profile.roadmap_progress.job_role.as_deref(), Some("Backend"));
    }

    #[test]
    fn repair_resets_section_itself() {
        let mut doc = json!({"user_id": "u1", "learning_profile": [1, 2]});
        let actions = repair(&mut doc);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].found, "array");
        assert_eq!(doc["learning_profile"], json!({}));
    }

    #[test]
    fn repair_leaves_clean_document_alone() {
        let profile = Profile::stub(UserId::parse("u1").unwrap(), chrono::Utc::now());
        let mut doc = serde_json::to_value(&profile).unwrap();
        let before = doc.clone();
        assert!(repair(&mut doc).is_empty());
        assert_eq!(doc, before);
    }

    #[test]
    fn kind_lookup() {
        assert_eq!(kind_of("learning_profile.history"), Some(FieldKind::List));
        assert_eq!(kind_of("learning_profile.skills"), Some(FieldKind::Map));
        assert_eq!(kind_of("platform_data.name"), None);
    }

    #[test]
    fn audit_flags_blank_identity() {
        let profile = Profile::stub(UserId::parse("u1").unwrap(), chrono::Utc::now());
        let violations = audit(&profile);
        assert_eq!(
            violations,
            vec![
                SchemaViolation::MissingField("platform_data.name"),
                SchemaViolation::MissingField("platform_data.email"),
            ]
        );
        assert_eq!(violations[0].to_string(), "platform_data.name is required");
    }
}
