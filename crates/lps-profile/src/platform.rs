//! External platform user records
//!
//! Read-only input consulted when a profile is created for the first time.

use crate::coerce::{de, to_text};
use serde::Deserialize;
use serde_json::Value;

/// One user as exported by the learning platform
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlatformUser {
    /// Platform id (numeric ids are read as text)
    #[serde(deserialize_with = "de::opt_text")]
    pub id: Option<String>,
    /// Login e-mail
    #[serde(deserialize_with = "de::opt_text")]
    pub email: Option<String>,
    /// Display name
    #[serde(deserialize_with = "de::opt_text")]
    pub name: Option<String>,
    /// Course the user is enrolled in
    #[serde(deserialize_with = "de::opt_text")]
    pub course_name: Option<String>,
    /// Tutorials in progress
    #[serde(deserialize_with = "de::integer")]
    pub active_tutorials: i64,
    /// Tutorials finished
    #[serde(deserialize_with = "de::integer")]
    pub completed_tutorials: i64,
    /// 1 once graduated
    #[serde(deserialize_with = "de::flag")]
    pub is_graduated: u8,
    /// Final exam score
    #[serde(deserialize_with = "de::opt_text")]
    pub exam_score: Option<String>,
    /// Submission rating
    #[serde(deserialize_with = "de::opt_text")]
    pub submission_rating: Option<String>,
}

impl PlatformUser {
    /// Whether this record is addressed by `key` (id or e-mail)
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key) || self.email.as_deref() == Some(key)
    }
}

/// Parse a platform export: either an array of users or an object whose
/// values are users. Records that fail to parse are skipped.
#[must_use]
pub fn parse_users(root: Value) -> Vec<PlatformUser> {
    let records: Vec<Value> = match root {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            tracing::warn!("Platform users export is neither array nor object: {}", to_text(&other));
            return Vec::new();
        }
    };

    records
        .into_iter()
        .filter_map(|record| match PlatformUser::deserialize(record) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Skipping malformed platform user: {}", e);
                None
            }
        })
        .collect()
}
