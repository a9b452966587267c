//! In-memory profile store

use crate::error::StoreError;
use crate::ProfileStore;
use async_trait::async_trait;
use dashmap::DashMap;
use lps_profile::{Profile, UserId};

/// Concurrent map of profiles, lost on drop
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: DashMap<UserId, Profile>,
}

impl MemoryProfileStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `profiles`, keyed by their own ids
    #[must_use]
    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let store = Self::new();
        for profile in profiles {
            store.profiles.insert(profile.user_id.clone(), profile);
        }
        store
    }

    /// Number of stored profiles
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// No profile stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load(&self, user_id: &UserId) -> Option<Profile> {
        self.profiles.get(user_id).map(|p| p.value().clone())
    }

    async fn save(&self, user_id: &UserId, profile: &Profile) -> Result<(), StoreError> {
        self.profiles.insert(user_id.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn roundtrip_and_len() {
        let id = UserId::parse("u1").unwrap();
        let store = MemoryProfileStore::new();
        assert!(store.is_empty());
        assert!(store.load(&id).await.is_none());

        let profile = Profile::stub(id.clone(), Utc::now());
        store.save(&id, &profile).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&id).await, Some(profile));
    }

    #[tokio::test]
    async fn with_profiles_keys_by_id() {
        let id = UserId::parse("seed").unwrap();
        let store = MemoryProfileStore::with_profiles([Profile::stub(id.clone(), Utc::now())]);
        assert!(store.load(&id).await.is_some());
    }
}
