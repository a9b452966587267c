//! LPS Profile
//!
//! The persisted per-user learning-state document and everything needed to
//! read it safely.
//!
//! # Core Concepts
//!
//! - [`Profile`]: the aggregate for one user (platform facts, learning state,
//!   roadmap state)
//! - [`UserId`]: validated identifier, also used as the storage key
//! - [`SkillLevel`]: the only three levels a skill may hold
//! - [`schema`]: container-kind table, load-time shape repair and audit
//! - [`coerce`]: loose value coercion for untrusted JSON
//! - [`summarize`]: read-only plain-text projection for the model
//!
//! # Example
//!
//! ```rust,ignore
//! use lps_profile::{Profile, UserId};
//!
//! let id = UserId::parse("user-42")?;
//! let profile = Profile::stub(id, chrono::Utc::now());
//! assert!(profile.learning_profile.history.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod coerce;
mod id;
mod model;
mod platform;
pub mod schema;
mod skill;
mod summary;

pub use id::{UserId, UserIdError};
pub use model::{
    CurrentFocus, HistoryEntry, LearningProfile, PlatformData, Profile, RoadmapProgress,
};
pub use platform::{parse_users, PlatformUser};
pub use schema::{FieldKind, RepairAction, SchemaViolation};
pub use skill::SkillLevel;
pub use summary::summarize;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
