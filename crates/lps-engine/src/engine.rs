//! Profile lifecycle manager
//!
//! Owns the store, the platform directory and one async mutex per user id.
//! Every read-modify-write of a profile (creation, patching) holds that
//! user's mutex, so concurrent updates for one user are applied one after
//! the other and none is lost. Different users never wait on each other.
//! A user's mutex is dropped from the map once no caller holds or awaits it.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::reply::{strip_profile_update_tags, ChatTurn, Inference, ModelReply, UpdateStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lps_merge::MergeEngine;
use lps_patch::{PatchValidator, ProfilePatch, ValidationReport};
use lps_profile::{schema, summarize, Profile, UserId};
use lps_store::{CachedProfileStore, FileProfileStore, PlatformDirectory, ProfileStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Engine over the on-disk store with a moka cache in front
pub type FileEngine = ProfileEngine<CachedProfileStore<FileProfileStore>>;

/// Profile lifecycle manager
#[derive(Debug)]
pub struct ProfileEngine<S> {
    store: S,
    directory: Arc<PlatformDirectory>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
    validator: PatchValidator,
    merger: MergeEngine,
    config: EngineConfig,
}

impl FileEngine {
    /// Engine for the layout described by `config`
    ///
    /// Nothing is read until the first operation.
    #[must_use]
    pub fn open(config: EngineConfig) -> Self {
        let store = CachedProfileStore::with_ttl(
            FileProfileStore::new(config.profiles_path()),
            config.cache_capacity,
            config.cache_ttl(),
        );
        let directory = Arc::new(PlatformDirectory::from_file(config.users_path()));
        tracing::info!("Opening profile engine at {}", config.data_dir.display());
        ProfileEngine::new(store, directory, config)
    }
}

impl<S: ProfileStore> ProfileEngine<S> {
    /// Create engine over `store`
    #[must_use]
    pub fn new(store: S, directory: Arc<PlatformDirectory>, config: EngineConfig) -> Self {
        Self {
            store,
            directory,
            locks: DashMap::new(),
            validator: PatchValidator::new(),
            merger: MergeEngine::new(),
            config,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Platform directory consulted on creation
    #[inline]
    #[must_use]
    pub fn directory(&self) -> &PlatformDirectory {
        &self.directory
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stored profile, if any
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidUserId`] for an unusable id.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, EngineError> {
        let id = UserId::parse(user_id)?;
        Ok(self.store.load(&id).await)
    }

    /// Stored profile, creating it first if needed
    ///
    /// A new profile is seeded from the platform user whose id or e-mail
    /// equals `user_id`, or is a bare stub.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] if a new profile cannot be persisted.
    pub async fn ensure_exists(&self, user_id: &str) -> Result<Profile, EngineError> {
        let id = UserId::parse(user_id)?;
        let lock = self.lock_for(&id);
        let result = {
            let _guard = lock.lock().await;
            self.ensure_locked(&id).await
        };
        self.release(&id, lock);
        result
    }

    /// Validate `patch` and merge it into the user's profile
    ///
    /// # Errors
    /// - [`EngineError::Validation`] when the patch is rejected; nothing is written
    /// - [`EngineError::Store`] when the merged profile cannot be saved; the
    ///   stored profile stays as it was
    pub async fn update_profile(&self, user_id: &str, patch: &Value) -> Result<Profile, EngineError> {
        let id = UserId::parse(user_id)?;
        self.update_with(&id, |_| patch.clone()).await
    }

    /// Merge an already sanitized patch
    ///
    /// The patch is trusted as is, so a history list must already contain
    /// the stored entries.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] when the merged profile cannot be saved.
    pub async fn apply_patch(&self, user_id: &str, patch: &ProfilePatch) -> Result<Profile, EngineError> {
        let id = UserId::parse(user_id)?;
        let lock = self.lock_for(&id);
        let result = {
            let _guard = lock.lock().await;
            match self.ensure_locked(&id).await {
                Ok(existing) => self.commit(&id, &existing, patch, Utc::now()).await,
                Err(e) => Err(e),
            }
        };
        self.release(&id, lock);
        result
    }

    /// Plain-text summary of the stored profile
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidUserId`] for an unusable id.
    pub async fn summary(&self, user_id: &str) -> Result<String, EngineError> {
        let profile = self.get_profile(user_id).await?;
        Ok(summarize(profile.as_ref()))
    }

    /// Profile as handed to the model service
    ///
    /// Ensures the profile exists and logs every audit finding. Findings do
    /// not block the turn.
    ///
    /// # Errors
    /// Same as [`Self::ensure_exists`].
    pub async fn profile_for_model(&self, user_id: &str) -> Result<Profile, EngineError> {
        let profile = self.ensure_exists(user_id).await?;
        for violation in schema::audit(&profile) {
            tracing::warn!("Profile {} incomplete: {}", profile.user_id, violation);
        }
        Ok(profile)
    }

    /// Absorb one model reply for `user_id`
    ///
    /// Profile updates carried by the reply (or inferred from its text when
    /// enabled) are applied through the validated update path. A rejected
    /// or unsaved update is reported in [`ChatTurn::update`]; the turn
    /// itself still succeeds with the last persisted profile.
    ///
    /// # Errors
    /// Only when the profile cannot be read or created.
    pub async fn absorb_reply(&self, user_id: &str, reply: &ModelReply) -> Result<ChatTurn, EngineError> {
        let id = UserId::parse(user_id)?;
        let text = strip_profile_update_tags(reply.reply_text());
        let current = self.ensure_exists(id.as_str()).await?;

        let outcome = if let Some(updates) = reply.updates() {
            Some(self.update_with(&id, |_| updates.clone()).await)
        } else if self.config.infer_from_reply {
            let inference = Inference::from_reply(&text);
            if inference.is_empty() {
                None
            } else {
                tracing::debug!("Inferred {:?} from reply for {}", inference, id);
                Some(self.update_with(&id, |existing| inference.to_patch(existing)).await)
            }
        } else {
            None
        };

        let (profile, update) = match outcome {
            None => (current, UpdateStatus::None),
            Some(Ok(updated)) => (updated, UpdateStatus::Applied),
            Some(Err(EngineError::Validation(report))) => {
                (current, UpdateStatus::Rejected(report.messages()))
            }
            Some(Err(e)) => {
                tracing::error!("Failed updating profile {} from reply: {}", id, e);
                let latest = self.store.load(&id).await.unwrap_or(current);
                (latest, UpdateStatus::Failed(e.to_string()))
            }
        };

        Ok(ChatTurn {
            reply: text,
            meta: reply.meta.clone().unwrap_or_else(|| json!({})),
            sources: reply.sources.clone().unwrap_or_else(|| json!([])),
            intent: reply.intent.clone().unwrap_or_else(|| json!({})),
            profile,
            update,
        })
    }

    fn lock_for(&self, id: &UserId) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(id.clone()).or_default().value())
    }

    /// Drop the entry once nobody else holds or waits on it
    fn release(&self, id: &UserId, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(id, |_, held| Arc::strong_count(held) == 1);
    }

    async fn ensure_locked(&self, id: &UserId) -> Result<Profile, EngineError> {
        if let Some(profile) = self.store.load_for_update(id).await.map_err(|e| {
            tracing::error!("Cannot read profile {} before writing: {}", id, e);
            EngineError::Store(e)
        })? {
            return Ok(profile);
        }

        let now = Utc::now();
        let profile = match self.directory.find(id.as_str()).await {
            Some(user) => {
                tracing::info!("Creating profile {} from platform data", id);
                Profile::from_platform(id.clone(), &user, now)
            }
            None => {
                tracing::info!("Creating stub profile {}", id);
                Profile::stub(id.clone(), now)
            }
        };

        self.store.save(id, &profile).await.map_err(|e| {
            tracing::error!("Failed to persist new profile {}: {}", id, e);
            EngineError::Store(e)
        })?;
        Ok(profile)
    }

    /// Validate-and-merge under the user's lock; `build` sees the stored profile
    async fn update_with<F>(&self, id: &UserId, build: F) -> Result<Profile, EngineError>
    where
        F: FnOnce(&Profile) -> Value + Send,
    {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            tracing::debug!("Acquired write lock for {}", id);
            self.update_locked(id, build).await
        };
        self.release(id, lock);
        result
    }

    async fn update_locked<F>(&self, id: &UserId, build: F) -> Result<Profile, EngineError>
    where
        F: FnOnce(&Profile) -> Value + Send,
    {
        let existing = self.ensure_locked(id).await?;
        let raw = build(&existing);
        let now = Utc::now();

        let patch = match self.validator.validate(&raw, &existing, now) {
            ValidationReport {
                sanitized: Some(patch),
                errors,
            } if errors.is_empty() => patch,
            rejected => {
                tracing::warn!(
                    "Rejected profile update for {}: {}",
                    id,
                    rejected.messages().join("; ")
                );
                return Err(EngineError::Validation(rejected));
            }
        };

        self.commit(id, &existing, &patch, now).await
    }

    async fn commit(
        &self,
        id: &UserId,
        existing: &Profile,
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<Profile, EngineError> {
        let merged = self.merger.merge(existing, patch, now);

        if let Err(e) = self.store.save(id, &merged).await {
            tracing::error!("Failed to save profile {}: {}", id, e);
            return Err(EngineError::Store(e));
        }

        tracing::info!("Applied profile update for {}", id);
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lps_store::MemoryProfileStore;
    use pretty_assertions::assert_eq;

    fn engine() -> ProfileEngine<MemoryProfileStore> {
        ProfileEngine::new(
            MemoryProfileStore::new(),
            Arc::new(PlatformDirectory::empty()),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn invalid_ids_are_refused() {
        let engine = engine();
        assert!(matches!(
            engine.get_profile("  ").await,
            Err(EngineError::InvalidUserId(_))
        ));
        assert!(engine.ensure_exists("../etc").await.is_err());
        assert!(engine.store().is_empty());
    }

    #[tokio::test]
    async fn update_creates_missing_profile() {
        let engine = engine();
        let updated = engine
            .update_profile("u1", &json!({"learning_profile": {"goals": ["Backend"]}}))
            .await
            .unwrap();
        assert_eq!(updated.learning_profile.goals, vec!["Backend".to_string()]);
        assert_eq!(engine.get_profile("u1").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn rejected_patch_writes_nothing() {
        let engine = engine();
        let before = engine.ensure_exists("u1").await.unwrap();

        let err = engine
            .update_profile("u1", &json!({"admin": true, "learning_profile": {"goals": ["x"]}}))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.get_profile("u1").await.unwrap(), Some(before));
    }

    #[tokio::test]
    async fn summary_of_missing_profile() {
        let engine = engine();
        assert_eq!(engine.summary("ghost").await.unwrap(), "No profile available.");
        assert!(engine.get_profile("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn locks_are_per_user() {
        let engine = engine();
        let a = engine.lock_for(&UserId::parse("a").unwrap());
        let again = engine.lock_for(&UserId::parse("a").unwrap());
        let b = engine.lock_for(&UserId::parse("b").unwrap());
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));

        let _held = a.lock().await;
        assert!(b.try_lock().is_ok());
    }

    #[tokio::test]
    async fn idle_locks_are_released() {
        let engine = engine();
        engine.ensure_exists("u1").await.unwrap();
        engine
            .update_profile("u2", &json!({"learning_profile": {"goals": ["x"]}}))
            .await
            .unwrap();
        let _ = engine.update_profile("u3", &json!({"bogus": 1})).await;
        assert!(engine.locks.is_empty());

        // an entry still held elsewhere survives a release
        let id = UserId::parse("u4").unwrap();
        let held = engine.lock_for(&id);
        engine.release(&id, engine.lock_for(&id));
        assert_eq!(engine.locks.len(), 1);
        engine.release(&id, held);
        assert!(engine.locks.is_empty());
    }
}
