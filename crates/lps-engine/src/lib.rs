//! LPS Engine
//!
//! The profile lifecycle: lazy creation, validated updates and per-user
//! write serialization, on top of [`lps_store`].
//!
//! # Core Concepts
//!
//! - [`ProfileEngine`]: owns a store, the platform directory and one lock
//!   per user id
//! - [`EngineConfig`]: data layout and cache sizing, loadable from TOML
//! - [`ModelReply`] / [`ChatTurn`]: absorbing a model answer that may carry
//!   profile updates
//!
//! # Update path
//!
//! ```text
//! raw JSON ─► PatchValidator ─► ProfilePatch ─► MergeEngine ─► store.save
//!                  │ rejected                                    │ failed
//!                  ▼                                             ▼
//!        EngineError::Validation                       EngineError::Store
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use lps_engine::{EngineConfig, FileEngine};
//! use serde_json::json;
//!
//! let engine = FileEngine::open(EngineConfig::default().with_data_dir("./data"));
//! let profile = engine
//!     .update_profile("42", &json!({"learning_profile": {"goals": ["Backend"]}}))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod engine;
mod error;
mod reply;

pub use config::EngineConfig;
pub use engine::{FileEngine, ProfileEngine};
pub use error::EngineError;
pub use reply::{
    strip_profile_update_tags, ChatTurn, Inference, ModelReply, UpdateStatus, DEFAULT_REPLY,
    INFERRED_GOAL, INFERRED_WEAKNESS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
