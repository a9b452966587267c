//! Roadmap reset policy
//!
//! Sub-skills and statuses are computed for one target role and mean
//! nothing for another, so a role switch replaces `roadmap_progress`
//! instead of merging into it.

use crate::rule::{rule_for, MergeRule};
use lps_patch::RoadmapPatch;
use lps_profile::RoadmapProgress;

/// How `roadmap_progress` combines for one patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadmapDecision {
    /// Patch leaves the roadmap alone
    Untouched,
    /// Field-by-field merge into the stored roadmap
    Merge,
    /// Stored roadmap is discarded; the patch becomes the roadmap
    Replace,
}

impl RoadmapDecision {
    /// Decide for `incoming` against the `stored` roadmap
    ///
    /// Replace iff the patch declares a non-empty job role, a role is already
    /// stored, and the two differ. A first role declaration merges, and so
    /// does an empty one.
    #[must_use]
    pub fn for_patch(stored: &RoadmapProgress, incoming: Option<&RoadmapPatch>) -> Self {
        let Some(incoming) = incoming else {
            return Self::Untouched;
        };

        match (stored.job_role.as_deref(), incoming.job_role.as_deref()) {
            (Some(old), Some(new)) if !new.is_empty() && old != new => Self::Replace,
            _ => Self::Merge,
        }
    }

    /// Rule applied to the `roadmap_progress` section
    #[inline]
    #[must_use]
    pub fn rule(&self) -> Option<MergeRule> {
        match self {
            RoadmapDecision::Untouched => None,
            RoadmapDecision::Merge => Some(rule_for("roadmap_progress")),
            RoadmapDecision::Replace => Some(MergeRule::ReplaceMap),
        }
    }
}
