//! Patch validation and sanitization

use crate::error::PatchError;
use crate::patch::{
    CurrentFocusPatch, LearningProfilePatch, PlatformDataPatch, ProfilePatch, RoadmapPatch,
};
use chrono::{DateTime, SecondsFormat, Utc};
use lps_profile::coerce::{is_present, to_flag, to_integer, to_number, to_percent, to_text};
use lps_profile::{HistoryEntry, Profile, SkillLevel};
use serde_json::{Map, Value};

/// Top-level keys a patch may carry
///
/// `updated_at` and `meta` are accepted but never applied: the merge stamps
/// `updated_at` itself and `meta` is model bookkeeping.
pub const ALLOWED_TOP_LEVEL_KEYS: [&str; 5] = [
    "platform_data",
    "learning_profile",
    "roadmap_progress",
    "updated_at",
    "meta",
];

/// Outcome of validating one patch
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Typed patch; `Some` only when `errors` is empty
    pub sanitized: Option<ProfilePatch>,
    /// Every problem found, in discovery order
    pub errors: Vec<PatchError>,
}

impl ValidationReport {
    /// Patch was accepted
    #[inline]
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages for the caller
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Split into the accepted patch or the errors
    ///
    /// # Errors
    /// Returns the collected errors when the patch was rejected.
    pub fn into_result(self) -> Result<ProfilePatch, Vec<PatchError>> {
        match self.sanitized {
            Some(patch) if self.errors.is_empty() => Ok(patch),
            _ => Err(self.errors),
        }
    }
}

/// Whitelisting patch validator
///
/// Reads the existing profile because history is sanitized into the full
/// append-only list, not just the new entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchValidator;

impl PatchValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate `patch` against `existing`
    ///
    /// Never fails: all problems are reported in the returned
    /// [`ValidationReport`].
    #[must_use]
    pub fn validate(&self, patch: &Value, existing: &Profile, now: DateTime<Utc>) -> ValidationReport {
        let Value::Object(patch) = patch else {
            return ValidationReport {
                sanitized: None,
                errors: vec![PatchError::NotAnObject],
            };
        };

        let mut errors = Vec::new();
        let mut sanitized = ProfilePatch::default();

        for key in patch.keys() {
            if !ALLOWED_TOP_LEVEL_KEYS.contains(&key.as_str()) {
                errors.push(PatchError::UnknownKey(key.clone()));
            }
        }

        if let Some(section) = section(patch, "platform_data", &mut errors) {
            sanitized.platform_data = Some(Self::platform_data(section, &mut errors));
        }
        if let Some(section) = section(patch, "learning_profile", &mut errors) {
            sanitized.learning_profile =
                Some(Self::learning_profile(section, existing, now, &mut errors));
        }
        if let Some(section) = section(patch, "roadmap_progress", &mut errors) {
            sanitized.roadmap_progress = Some(Self::roadmap(section, now, &mut errors));
        }

        if errors.is_empty() {
            ValidationReport {
                sanitized: Some(sanitized),
                errors,
            }
        } else {
            tracing::debug!("Patch rejected with {} error(s)", errors.len());
            ValidationReport {
                sanitized: None,
                errors,
            }
        }
    }

    fn platform_data(pd: &Map<String, Value>, errors: &mut Vec<PatchError>) -> PlatformDataPatch {
        let mut out = PlatformDataPatch {
            name: text(pd, "name"),
            email: text(pd, "email"),
            exam_score: text(pd, "exam_score"),
            submission_rating: text(pd, "submission_rating"),
            active_tutorials: present(pd, "active_tutorials").map(to_integer),
            completed_tutorials: present(pd, "completed_tutorials").map(to_integer),
            is_graduated: present(pd, "is_graduated").map(to_flag),
            ..PlatformDataPatch::default()
        };

        out.active_courses = text_list(pd, "active_courses", "platform_data.active_courses", errors);

        if let Some(progress) = mapping(pd, "course_progress", "platform_data.course_progress", errors) {
            out.course_progress = Some(
                progress
                    .iter()
                    .map(|(course, pct)| (course.clone(), to_percent(pct)))
                    .collect(),
            );
        }

        out
    }

    fn learning_profile(
        lp: &Map<String, Value>,
        existing: &Profile,
        now: DateTime<Utc>,
        errors: &mut Vec<PatchError>,
    ) -> LearningProfilePatch {
        let mut out = LearningProfilePatch {
            goals: text_list(lp, "goals", "learning_profile.goals", errors),
            weaknesses: text_list(lp, "weaknesses", "learning_profile.weaknesses", errors),
            strengths: text_list(lp, "strengths", "learning_profile.strengths", errors),
            learning_style: text(lp, "learning_style"),
            ..LearningProfilePatch::default()
        };

        if let Some(skills) = mapping(lp, "skills", "learning_profile.skills", errors) {
            let mut accepted = std::collections::BTreeMap::new();
            for (skill, level) in skills {
                let raw = to_text(level);
                match SkillLevel::parse_loose(&raw) {
                    Some(level) => {
                        accepted.insert(skill.clone(), level);
                    }
                    None => errors.push(PatchError::InvalidSkillLevel {
                        skill: skill.clone(),
                        level: raw,
                    }),
                }
            }
            out.skills = Some(accepted);
        }

        if let Some(scores) = mapping(lp, "progress_score", "learning_profile.progress_score", errors) {
            let mut accepted = std::collections::BTreeMap::new();
            for (key, value) in scores {
                let n = to_number(value);
                if n.is_finite() {
                    accepted.insert(key.clone(), n);
                } else {
                    errors.push(PatchError::InvalidScore {
                        key: key.clone(),
                        value: to_text(value),
                    });
                }
            }
            out.progress_score = Some(accepted);
        }

        if let Some(focus) = section(lp, "current_focus", errors) {
            out.current_focus = Some(Self::current_focus(focus, errors));
        }

        if let Some(history) = present(lp, "history") {
            match history {
                Value::Array(entries) => {
                    let mut full = existing.learning_profile.history.clone();
                    full.extend(entries.iter().filter_map(|h| history_entry(h, now)));
                    out.history = Some(full);
                }
                _ => errors.push(PatchError::ExpectedArray {
                    field: "learning_profile.history",
                }),
            }
        }

        out
    }

    fn current_focus(focus: &Map<String, Value>, errors: &mut Vec<PatchError>) -> CurrentFocusPatch {
        let mut out = CurrentFocusPatch {
            course: text(focus, "course"),
            module: None,
        };

        if let Some(module) = present(focus, "module") {
            let n = to_number(module);
            if n.is_finite() && n >= 0.0 {
                // saturating cast
                out.module = Some(n.floor().min(f64::from(u32::MAX)) as u32);
            } else {
                errors.push(PatchError::InvalidModule(to_text(module)));
            }
        }

        out
    }

    fn roadmap(rp: &Map<String, Value>, now: DateTime<Utc>, errors: &mut Vec<PatchError>) -> RoadmapPatch {
        let now_ms = now.timestamp_millis();
        let stamp = |v: &Value| {
            let n = to_integer(v);
            if n == 0 {
                now_ms
            } else {
                n
            }
        };

        let mut out = RoadmapPatch {
            job_role: text(rp, "job_role"),
            created_at: present(rp, "created_at").map(stamp),
            last_updated: present(rp, "last_updated").map(stamp),
            ..RoadmapPatch::default()
        };

        if let Some(subskills) = present(rp, "subskills") {
            match subskills {
                Value::Array(items) => out.subskills = Some(items.clone()),
                _ => errors.push(PatchError::ExpectedArray {
                    field: "roadmap_progress.subskills",
                }),
            }
        }

        out.skills_status =
            mapping(rp, "skills_status", "roadmap_progress.skills_status", errors).cloned();

        out
    }
}

/// Validate `patch` against `existing` with a default [`PatchValidator`]
#[must_use]
pub fn validate(patch: &Value, existing: &Profile, now: DateTime<Utc>) -> ValidationReport {
    PatchValidator::new().validate(patch, existing, now)
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let value = obj.get(key);
    if is_present(value) {
        value
    } else {
        None
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    present(obj, key).map(to_text)
}

/// Nested object that must be a JSON object when present
fn section<'a>(
    obj: &'a Map<String, Value>,
    key: &'static str,
    errors: &mut Vec<PatchError>,
) -> Option<&'a Map<String, Value>> {
    match present(obj, key)? {
        Value::Object(map) => Some(map),
        _ => {
            errors.push(PatchError::ExpectedObject {
                field: section_path(key),
            });
            None
        }
    }
}

fn section_path(key: &'static str) -> &'static str {
    match key {
        "current_focus" => "learning_profile.current_focus",
        other => other,
    }
}

fn mapping<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
    errors: &mut Vec<PatchError>,
) -> Option<&'a Map<String, Value>> {
    match present(obj, key)? {
        Value::Object(map) => Some(map),
        _ => {
            errors.push(PatchError::ExpectedMapping { field });
            None
        }
    }
}

fn text_list(
    obj: &Map<String, Value>,
    key: &str,
    field: &'static str,
    errors: &mut Vec<PatchError>,
) -> Option<Vec<String>> {
    match present(obj, key)? {
        Value::Array(items) => Some(items.iter().map(to_text).collect()),
        _ => {
            errors.push(PatchError::ExpectedArray { field });
            None
        }
    }
}

/// Non-object history elements are dropped silently
fn history_entry(raw: &Value, now: DateTime<Utc>) -> Option<HistoryEntry> {
    let Value::Object(h) = raw else {
        return None;
    };
    Some(HistoryEntry {
        query: text(h, "query").unwrap_or_default(),
        response: text(h, "response").unwrap_or_default(),
        timestamp: text(h, "timestamp")
            .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        intent: present(h, "intent").cloned(),
    })
}
