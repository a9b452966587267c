//! LPS Patch
//!
//! Validation of untrusted profile updates.
//!
//! A patch arrives as arbitrary JSON, from a browser client or from the
//! model service. [`PatchValidator`] whitelists its keys, coerces scalars,
//! normalizes skill levels and collects every field-level problem into a
//! [`ValidationReport`]. Only a report with no errors yields a typed
//! [`ProfilePatch`], and only that typed patch is ever merged.
//!
//! # Error collection
//!
//! - Unknown top-level keys never stop validation of the other keys.
//! - A misshaped section (`platform_data` that is not an object, ...) adds
//!   one error and the section is skipped.
//! - Inside a well-formed map, a bad entry adds its own error without
//!   blocking its siblings.
//!
//! # Example
//!
//! ```rust,ignore
//! use lps_patch::PatchValidator;
//!
//! let report = PatchValidator::new().validate(&raw, &existing, chrono::Utc::now());
//! if let Some(patch) = report.sanitized {
//!     // merge
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod patch;
mod validator;

pub use error::PatchError;
pub use patch::{
    CurrentFocusPatch, LearningProfilePatch, PlatformDataPatch, ProfilePatch, RoadmapPatch,
};
pub use validator::{validate, PatchValidator, ValidationReport, ALLOWED_TOP_LEVEL_KEYS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
