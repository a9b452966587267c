//! LPS Store
//!
//! Durable storage for profile documents, plus the read-only platform user
//! directory consulted when a profile is first created.
//!
//! # Architecture
//!
//! ```text
//! ProfileEngine → CachedProfileStore (moka) → FileProfileStore → <dir>/<user_id>.json
//!                                           ↘ MemoryProfileStore (tests, embedding)
//! ```
//!
//! Plain reads never fail: a missing, empty or unreadable document is "no
//! profile". Reads that precede a write go through
//! [`ProfileStore::load_for_update`], which never lets an unreadable
//! document be overwritten in place. Writes fail loudly with
//! [`StoreError`], and callers must not report an unsaved merge as the new
//! state.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cached;
pub mod directory;
pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;
use lps_profile::{Profile, UserId};
use std::fmt::Debug;
use std::sync::Arc;

pub use cached::{CacheStats, CachedProfileStore};
pub use directory::PlatformDirectory;
pub use error::StoreError;
pub use file::{decode_profile, FileProfileStore};
pub use memory::MemoryProfileStore;

/// One document per user, addressed by user id
#[async_trait]
pub trait ProfileStore: Send + Sync + Debug {
    /// Read the stored profile; any read failure is reported as `None`
    async fn load(&self, user_id: &UserId) -> Option<Profile>;

    /// Read before a write
    ///
    /// Unlike [`ProfileStore::load`], a document that exists but cannot be
    /// read is never reported as absent while it is still in place: stores
    /// either move it aside first or fail.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the document could not be read or set aside.
    async fn load_for_update(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.load(user_id).await)
    }

    /// Durably write `profile` under `user_id`
    ///
    /// # Errors
    /// Returns [`StoreError`] if the document could not be committed.
    async fn save(&self, user_id: &UserId, profile: &Profile) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: ProfileStore + ?Sized> ProfileStore for Arc<S> {
    async fn load(&self, user_id: &UserId) -> Option<Profile> {
        (**self).load(user_id).await
    }

    async fn load_for_update(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        (**self).load_for_update(user_id).await
    }

    async fn save(&self, user_id: &UserId, profile: &Profile) -> Result<(), StoreError> {
        (**self).save(user_id, profile).await
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
