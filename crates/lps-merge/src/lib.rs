//! LPS Merge
//!
//! Applies a sanitized [`ProfilePatch`](lps_patch::ProfilePatch) to a stored
//! [`Profile`](lps_profile::Profile).
//!
//! # Core Concepts
//!
//! - [`MergeRule`]: how one field path combines (replace a scalar, replace a
//!   list, merge a map key by key, replace a map wholesale)
//! - [`RULES`]: the rule for every field path a patch can reach
//! - [`RoadmapDecision`]: the pre-check that switches `roadmap_progress`
//!   from merge to replace when the job role changes
//! - [`deep_merge`]: the generic rule for untyped JSON below a map entry
//!
//! # Example
//!
//! ```rust,ignore
//! use lps_merge::MergeEngine;
//!
//! let merged = MergeEngine::new().merge(&stored, &patch, chrono::Utc::now());
//! assert!(merged.updated_at >= stored.updated_at);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod roadmap;
mod rule;

pub use engine::{merge, MergeEngine};
pub use roadmap::RoadmapDecision;
pub use rule::{deep_merge, rule_for, MergeRule, Mergeable, RULES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
