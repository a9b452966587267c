//! Read-through / write-through profile cache using moka

use crate::error::StoreError;
use crate::ProfileStore;
use async_trait::async_trait;
use lps_profile::{Profile, UserId};
use moka::future::Cache;
use std::time::Duration;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Caching layer in front of another [`ProfileStore`]
///
/// The cache only ever holds documents that were read from or successfully
/// written to the inner store; a failed save leaves it untouched.
#[derive(Debug)]
pub struct CachedProfileStore<S> {
    inner: S,
    cache: Cache<UserId, Profile>,
}

impl<S: ProfileStore> CachedProfileStore<S> {
    /// Wrap `inner` with a cache of `max_capacity` profiles
    #[inline]
    #[must_use]
    pub fn new(inner: S, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_capacity),
        }
    }

    /// Wrap `inner` with a cache whose entries expire after `ttl`
    #[inline]
    #[must_use]
    pub fn with_ttl(inner: S, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Wrapped store
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop the cached copy of one profile
    #[inline]
    pub async fn invalidate(&self, user_id: &UserId) {
        self.cache.invalidate(user_id).await;
    }

    /// Drop every cached profile
    #[inline]
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileStore for CachedProfileStore<S> {
    async fn load(&self, user_id: &UserId) -> Option<Profile> {
        if let Some(hit) = self.cache.get(user_id).await {
            tracing::debug!("Profile cache hit for {}", user_id);
            return Some(hit);
        }

        let loaded = self.inner.load(user_id).await?;
        self.cache.insert(user_id.clone(), loaded.clone()).await;
        Some(loaded)
    }

    async fn load_for_update(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        if let Some(hit) = self.cache.get(user_id).await {
            return Ok(Some(hit));
        }

        let loaded = self.inner.load_for_update(user_id).await?;
        if let Some(profile) = &loaded {
            self.cache.insert(user_id.clone(), profile.clone()).await;
        }
        Ok(loaded)
    }

    async fn save(&self, user_id: &UserId, profile: &Profile) -> Result<(), StoreError> {
        self.inner.save(user_id, profile).await?;
        self.cache.insert(user_id.clone(), profile.clone()).await;
        Ok(())
    }
}
