//! Profile merge

use crate::roadmap::RoadmapDecision;
use crate::rule::{MergeRule, Mergeable};
use chrono::{DateTime, Utc};
use lps_patch::{LearningProfilePatch, PlatformDataPatch, ProfilePatch, RoadmapPatch};
use lps_profile::{LearningProfile, PlatformData, Profile, RoadmapProgress};

/// Deterministic merge of sanitized patches
///
/// Total over well-formed inputs: there is no failure path. `user_id`,
/// `created_at` and unmodelled top-level keys are carried over untouched;
/// `updated_at` is always set to `now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine;

impl MergeEngine {
    /// Create new merge engine
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Merge `patch` into a copy of `existing`
    #[must_use]
    pub fn merge(&self, existing: &Profile, patch: &ProfilePatch, now: DateTime<Utc>) -> Profile {
        let mut merged = existing.clone();

        if let Some(pd) = &patch.platform_data {
            merge_platform(&mut merged.platform_data, pd.clone());
        }
        if let Some(lp) = &patch.learning_profile {
            merge_learning(&mut merged.learning_profile, lp.clone());
        }

        let decision =
            RoadmapDecision::for_patch(&existing.roadmap_progress, patch.roadmap_progress.as_ref());
        if let (Some(rule), Some(rp)) = (decision.rule(), &patch.roadmap_progress) {
            if rule == MergeRule::ReplaceMap {
                tracing::info!(
                    "Roadmap reset for {}: job role {:?} -> {:?}",
                    existing.user_id,
                    existing.roadmap_progress.job_role,
                    rp.job_role
                );
            }
            merge_roadmap(&mut merged.roadmap_progress, rp.clone(), rule, now);
        }

        merged.updated_at = now;
        merged
    }
}

/// Merge `patch` into `existing` with a default [`MergeEngine`]
#[must_use]
pub fn merge(existing: &Profile, patch: &ProfilePatch, now: DateTime<Utc>) -> Profile {
    MergeEngine::new().merge(existing, patch, now)
}

fn merge_platform(target: &mut PlatformData, p: PlatformDataPatch) {
    target.name.absorb_at("platform_data.name", p.name);
    target.email.absorb_at("platform_data.email", p.email);
    target
        .active_courses
        .absorb_at("platform_data.active_courses", p.active_courses);
    target
        .active_tutorials
        .absorb_at("platform_data.active_tutorials", p.active_tutorials);
    target
        .completed_tutorials
        .absorb_at("platform_data.completed_tutorials", p.completed_tutorials);
    target
        .is_graduated
        .absorb_at("platform_data.is_graduated", p.is_graduated);
    target
        .exam_score
        .absorb_at("platform_data.exam_score", p.exam_score.map(Some));
    target
        .submission_rating
        .absorb_at("platform_data.submission_rating", p.submission_rating.map(Some));
    target
        .course_progress
        .absorb_at("platform_data.course_progress", p.course_progress);
}

fn merge_learning(target: &mut LearningProfile, p: LearningProfilePatch) {
    target.goals.absorb_at("learning_profile.goals", p.goals);
    target.skills.absorb_at("learning_profile.skills", p.skills);
    target
        .weaknesses
        .absorb_at("learning_profile.weaknesses", p.weaknesses);
    target
        .strengths
        .absorb_at("learning_profile.strengths", p.strengths);
    target
        .learning_style
        .absorb_at("learning_profile.learning_style", p.learning_style.map(Some));
    target
        .progress_score
        .absorb_at("learning_profile.progress_score", p.progress_score);
    target.history.absorb_at("learning_profile.history", p.history);

    if let Some(focus) = p.current_focus {
        target
            .current_focus
            .course
            .absorb_at("learning_profile.current_focus.course", focus.course.map(Some));
        target
            .current_focus
            .module
            .absorb_at("learning_profile.current_focus.module", focus.module);
    }
}

fn merge_roadmap(target: &mut RoadmapProgress, p: RoadmapPatch, rule: MergeRule, now: DateTime<Utc>) {
    if rule == MergeRule::ReplaceMap {
        let now_ms = now.timestamp_millis();
        *target = RoadmapProgress {
            job_role: p.job_role,
            created_at: p.created_at.unwrap_or(now_ms),
            last_updated: p.last_updated.unwrap_or(now_ms),
            skills_status: p.skills_status.unwrap_or_default(),
            subskills: p.subskills.unwrap_or_default(),
        };
        return;
    }

    target
        .job_role
        .absorb_at("roadmap_progress.job_role", p.job_role.map(Some));
    target
        .created_at
        .absorb_at("roadmap_progress.created_at", p.created_at);
    target
        .last_updated
        .absorb_at("roadmap_progress.last_updated", p.last_updated);
    target
        .skills_status
        .absorb_at("roadmap_progress.skills_status", p.skills_status);
    target
        .subskills
        .absorb_at("roadmap_progress.subskills", p.subskills);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lps_patch::{validate, CurrentFocusPatch};
    use lps_profile::{HistoryEntry, SkillLevel, UserId};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn t(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn stored() -> Profile {
        let mut p = Profile::stub(UserId::parse("u1").unwrap(), t("2025-01-01T00:00:00Z"));
        p.platform_data.name = "Ana".into();
        p.platform_data.active_courses = vec!["A".into(), "B".into()];
        p.platform_data.course_progress.insert("A".into(), 40);
        p.learning_profile.skills.insert("Go".into(), SkillLevel::Beginner);
        p.roadmap_progress.job_role = Some("Backend".into());
        p.roadmap_progress.subskills = vec![json!({"name": "sql"})];
        p.roadmap_progress
            .skills_status
            .insert("sql".into(), json!({"done": true}));
        p.extra.insert("progress_history".into(), json!([1]));
        p
    }

    fn sanitize(existing: &Profile, raw: Value) -> ProfilePatch {
        validate(&raw, existing, t("2025-02-01T00:00:00Z"))
            .into_result()
            .unwrap()
    }

    #[test]
    fn arrays_replace_never_concatenate() {
        let existing = stored();
        let patch = sanitize(&existing, json!({"platform_data": {"active_courses": ["Y"]}}));
        let merged = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        assert_eq!(merged.platform_data.active_courses, vec!["Y".to_string()]);
        assert_eq!(merged.platform_data.name, "Ana");
    }

    #[test]
    fn maps_merge_key_by_key() {
        let existing = stored();
        let patch = sanitize(
            &existing,
            json!({
                "platform_data": {"course_progress": {"B": 10}},
                "learning_profile": {"skills": {"Rust": "intermediate"}}
            }),
        );
        let merged = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        assert_eq!(merged.platform_data.course_progress["A"], 40);
        assert_eq!(merged.platform_data.course_progress["B"], 10);
        assert_eq!(merged.learning_profile.skills["Go"], SkillLevel::Beginner);
        assert_eq!(merged.learning_profile.skills["Rust"], SkillLevel::Intermediate);
    }

    #[test]
    fn updated_at_always_stamped_and_identity_kept() {
        let existing = stored();
        let now = t("2025-06-01T00:00:00Z");
        let merged = merge(&existing, &ProfilePatch::default(), now);
        assert_eq!(merged.updated_at, now);
        assert_eq!(merged.created_at, existing.created_at);
        assert_eq!(merged.user_id, existing.user_id);
        assert_eq!(merged.extra, existing.extra);
    }

    #[test]
    fn current_focus_merges_fields() {
        let mut existing = stored();
        existing.learning_profile.current_focus.course = Some("A".into());
        existing.learning_profile.current_focus.module = 4;

        let patch = ProfilePatch {
            learning_profile: Some(LearningProfilePatch {
                current_focus: Some(CurrentFocusPatch {
                    course: None,
                    module: Some(5),
                }),
                ..LearningProfilePatch::default()
            }),
            ..ProfilePatch::default()
        };
        let merged = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        assert_eq!(merged.learning_profile.current_focus.course.as_deref(), Some("A"));
        assert_eq!(merged.learning_profile.current_focus.module, 5);
    }

    #[test]
    fn role_switch_replaces_roadmap() {
        let existing = stored();
        let now = t("2025-02-01T00:00:00Z");
        let patch = sanitize(&existing, json!({"roadmap_progress": {"job_role": "DevOps"}}));
        let merged = merge(&existing, &patch, now);

        let rp = &merged.roadmap_progress;
        assert_eq!(rp.job_role.as_deref(), Some("DevOps"));
        assert!(rp.subskills.is_empty());
        assert!(rp.skills_status.is_empty());
        assert_eq!(rp.created_at, now.timestamp_millis());
        assert_eq!(rp.last_updated, now.timestamp_millis());
    }

    #[test]
    fn role_switch_takes_patch_contents_exactly() {
        let existing = stored();
        let patch = sanitize(
            &existing,
            json!({"roadmap_progress": {"job_role": "DevOps", "subskills": [{"name": "k8s"}]}}),
        );
        let merged = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        assert_eq!(merged.roadmap_progress.subskills, vec![json!({"name": "k8s"})]);
    }

    #[test]
    fn same_role_merges_statuses() {
        let existing = stored();
        let patch = sanitize(
            &existing,
            json!({"roadmap_progress": {"job_role": "Backend", "skills_status": {"http": "todo"}}}),
        );
        let merged = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        let status = &merged.roadmap_progress.skills_status;
        assert_eq!(status["sql"], json!({"done": true}));
        assert_eq!(status["http"], json!("todo"));
        assert_eq!(merged.roadmap_progress.subskills, existing.roadmap_progress.subskills);
        assert_eq!(merged.roadmap_progress.created_at, existing.roadmap_progress.created_at);
    }

    #[test]
    fn skills_status_values_deep_merge() {
        let existing = stored();
        let patch = sanitize(
            &existing,
            json!({"roadmap_progress": {"skills_status": {"sql": {"score": 3}}}}),
        );
        let merged = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        assert_eq!(
            merged.roadmap_progress.skills_status["sql"],
            json!({"done": true, "score": 3})
        );
    }

    #[test]
    fn history_grows_in_order_across_patches() {
        let mut profile = stored();
        for (i, q) in ["first", "second"].into_iter().enumerate() {
            let patch = sanitize(&profile, json!({"learning_profile": {"history": [{"query": q}]}}));
            profile = merge(&profile, &patch, t("2025-02-01T00:00:00Z"));
            assert_eq!(profile.learning_profile.history.len(), i + 1);
        }
        let queries: Vec<_> = profile
            .learning_profile
            .history
            .iter()
            .map(|h: &HistoryEntry| h.query.as_str())
            .collect();
        assert_eq!(queries, vec!["first", "second"]);
    }

    #[test]
    fn replaying_sanitized_patch_is_idempotent() {
        let existing = stored();
        let patch = sanitize(
            &existing,
            json!({
                "platform_data": {"active_courses": ["Z"], "course_progress": {"Z": 5}},
                "learning_profile": {"skills": {"Go": "advanced"}, "history": [{"query": "q"}]},
                "roadmap_progress": {"job_role": "DevOps"}
            }),
        );
        let once = merge(&existing, &patch, t("2025-02-01T00:00:00Z"));
        let mut twice = merge(&once, &patch, t("2025-02-02T00:00:00Z"));
        twice.updated_at = once.updated_at;
        assert_eq!(twice, once);
    }

    #[test]
    fn rejected_skill_keeps_stored_value() {
        let existing = stored();
        let report = validate(
            &json!({"learning_profile": {"skills": {"Go": "Expert"}}}),
            &existing,
            t("2025-02-01T00:00:00Z"),
        );
        assert!(!report.is_ok());
        // nothing to merge; stored level is what the profile keeps
        assert_eq!(existing.learning_profile.skills["Go"], SkillLevel::Beginner);
    }
}
