//! Profile document types
//!
//! The on-disk shape is the JSON written by earlier versions of the
//! service, so every section tolerates missing fields and loosely typed
//! scalars (see [`crate::coerce::de`]).

use crate::coerce::de;
use crate::id::UserId;
use crate::platform::PlatformUser;
use crate::skill::SkillLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Persisted learning state of one user
///
/// # Invariants
/// - `user_id` never changes once the profile exists
/// - `created_at` is set once; `updated_at` moves on every accepted patch
/// - `learning_profile.history` only grows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner and storage key
    pub user_id: UserId,

    /// Facts mirrored from the learning platform
    #[serde(default)]
    pub platform_data: PlatformData,

    /// State learned from conversations
    #[serde(default)]
    pub learning_profile: LearningProfile,

    /// Progress towards the declared job role
    #[serde(default)]
    pub roadmap_progress: RoadmapProgress,

    /// Creation time
    #[serde(default = "Utc::now", deserialize_with = "stamp::flexible")]
    pub created_at: DateTime<Utc>,

    /// Time of the last accepted update
    #[serde(default = "Utc::now", deserialize_with = "stamp::flexible")]
    pub updated_at: DateTime<Utc>,

    /// Top-level keys this version does not model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Minimal profile for an id the platform does not know
    #[must_use]
    pub fn stub(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            platform_data: PlatformData::default(),
            learning_profile: LearningProfile::default(),
            roadmap_progress: RoadmapProgress::empty(now.timestamp_millis()),
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    /// Profile seeded from a platform user record
    ///
    /// The record's `course_name` becomes the single active course and the
    /// current focus. The profile is keyed by `user_id`, not by the record's
    /// own id, so the document and its storage location always agree.
    #[must_use]
    pub fn from_platform(user_id: UserId, user: &PlatformUser, now: DateTime<Utc>) -> Self {
        let mut profile = Self::stub(user_id, now);

        let course = user.course_name.clone().filter(|c| !c.is_empty());

        profile.platform_data = PlatformData {
            name: user.name.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            active_courses: course.iter().cloned().collect(),
            active_tutorials: user.active_tutorials,
            completed_tutorials: user.completed_tutorials,
            is_graduated: user.is_graduated,
            exam_score: Some(user.exam_score.clone().unwrap_or_default()),
            submission_rating: Some(user.submission_rating.clone().unwrap_or_default()),
            course_progress: BTreeMap::new(),
        };
        profile.learning_profile.current_focus.course = course;

        profile
    }
}

/// Platform-side facts about the learner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformData {
    /// Display name
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    /// Contact e-mail
    #[serde(deserialize_with = "de::text")]
    pub email: String,
    /// Courses currently enrolled
    #[serde(deserialize_with = "de::text_list")]
    pub active_courses: Vec<String>,
    /// Tutorials in progress
    #[serde(deserialize_with = "de::integer")]
    pub active_tutorials: i64,
    /// Tutorials finished
    #[serde(deserialize_with = "de::integer")]
    pub completed_tutorials: i64,
    /// 1 once the learner graduated, else 0
    #[serde(deserialize_with = "de::flag")]
    pub is_graduated: u8,
    /// Final exam score as reported by the platform
    #[serde(deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub exam_score: Option<String>,
    /// Project submission rating as reported by the platform
    #[serde(deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub submission_rating: Option<String>,
    /// Course name → percent complete (0..=100)
    #[serde(deserialize_with = "de::percent_map")]
    pub course_progress: BTreeMap<String, u8>,
}

/// Learner state inferred from conversations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningProfile {
    /// Stated goals
    #[serde(deserialize_with = "de::text_list")]
    pub goals: Vec<String>,
    /// Skill name → level
    #[serde(deserialize_with = "de::skill_map")]
    pub skills: BTreeMap<String, SkillLevel>,
    /// Known difficulties
    #[serde(deserialize_with = "de::text_list")]
    pub weaknesses: Vec<String>,
    /// Known strengths
    #[serde(deserialize_with = "de::text_list")]
    pub strengths: Vec<String>,
    /// Where the learner currently is
    pub current_focus: CurrentFocus,
    /// Free-form learning style
    #[serde(deserialize_with = "de::opt_text")]
    pub learning_style: Option<String>,
    /// Course name → score
    #[serde(deserialize_with = "de::score_map")]
    pub progress_score: BTreeMap<String, f64>,
    /// Conversation log, append-only
    #[serde(deserialize_with = "de::history")]
    pub history: Vec<HistoryEntry>,
}

/// Course and module the learner is working on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentFocus {
    /// Course name, if any
    #[serde(deserialize_with = "de::opt_text")]
    pub course: Option<String>,
    /// Zero-based module index
    #[serde(deserialize_with = "de::module")]
    pub module: u32,
}

/// One exchange with the assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    /// What the learner asked
    #[serde(deserialize_with = "de::text")]
    pub query: String,
    /// What the assistant answered
    #[serde(deserialize_with = "de::text")]
    pub response: String,
    /// RFC 3339 time of the exchange
    #[serde(deserialize_with = "de::text")]
    pub timestamp: String,
    /// Intent classification attached by the model, if any
    pub intent: Option<Value>,
}

/// Roadmap progress for one target job role
///
/// `skills_status` and `subskills` only make sense for the role they were
/// computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapProgress {
    /// Target role, `None` until declared
    #[serde(deserialize_with = "de::opt_text")]
    pub job_role: Option<String>,
    /// Creation time, epoch milliseconds
    #[serde(deserialize_with = "de::epoch_ms")]
    pub created_at: i64,
    /// Last change, epoch milliseconds
    #[serde(deserialize_with = "de::epoch_ms")]
    pub last_updated: i64,
    /// Skill → status as computed by the roadmap feature
    pub skills_status: Map<String, Value>,
    /// Sub-skill records, opaque to the engine
    pub subskills: Vec<Value>,
}

impl RoadmapProgress {
    /// Roadmap with no role and no progress
    #[must_use]
    pub fn empty(now_ms: i64) -> Self {
        Self {
            job_role: None,
            created_at: now_ms,
            last_updated: now_ms,
            skills_status: Map::new(),
            subskills: Vec::new(),
        }
    }
}

impl Default for RoadmapProgress {
    /// Empty roadmap stamped with the current time
    fn default() -> Self {
        Self::empty(Utc::now().timestamp_millis())
    }
}

/// Document-level timestamps were written both as RFC 3339 strings and as
/// epoch milliseconds.
mod stamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Unreadable stamps fall back to now rather than failing the document
    pub(super) fn flexible<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = Value::deserialize(d)?;
        let parsed = match &raw {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        };
        Ok(parsed.unwrap_or_else(|| {
            if !raw.is_null() {
                tracing::warn!("Unreadable timestamp {}, using now", raw);
            }
            Utc::now()
        }))
    }
}
