//! Typed, sanitized patches
//!
//! Every field is independently optional: `None` means "not part of this
//! update". A value is only ever `Some` after it passed validation.

use lps_profile::{HistoryEntry, SkillLevel};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Sanitized projection of an accepted patch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfilePatch {
    /// Platform facts to update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_data: Option<PlatformDataPatch>,
    /// Learning state to update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_profile: Option<LearningProfilePatch>,
    /// Roadmap state to update or replace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap_progress: Option<RoadmapPatch>,
}

impl ProfilePatch {
    /// No section is touched
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platform_data.is_none()
            && self.learning_profile.is_none()
            && self.roadmap_progress.is_none()
    }

    /// Job role declared by this patch, if any
    #[inline]
    #[must_use]
    pub fn job_role(&self) -> Option<&str> {
        self.roadmap_progress
            .as_ref()
            .and_then(|r| r.job_role.as_deref())
    }
}

/// Updates to `platform_data`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct PlatformDataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_courses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_tutorials: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_tutorials: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_graduated: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_rating: Option<String>,
    /// Course → percent, already rounded and clamped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_progress: Option<BTreeMap<String, u8>>,
}

/// Updates to `learning_profile`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct LearningProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<String>,
    /// Only entries with a recognized level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeMap<String, SkillLevel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_score: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_focus: Option<CurrentFocusPatch>,
    /// Full history: stored entries followed by the new ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

/// Updates to `learning_profile.current_focus`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct CurrentFocusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<u32>,
}

/// Updates to `roadmap_progress`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct RoadmapPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_role: Option<String>,
    /// Epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_status: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subskills: Option<Vec<Value>>,
}
