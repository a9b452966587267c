//! JSON file per user

use crate::error::StoreError;
use crate::ProfileStore;
use async_trait::async_trait;
use lps_profile::{schema, Profile, UserId};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Profiles stored as `<dir>/<user_id>.json`
///
/// Writes go to a sibling temporary file that is renamed into place, so a
/// reader never observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    dir: PathBuf,
}

impl FileProfileStore {
    /// Store rooted at `dir`; the directory is created on first write
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the documents
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Document path for `user_id`
    #[inline]
    #[must_use]
    pub fn path_for(&self, user_id: &UserId) -> PathBuf {
        self.dir.join(format!("{user_id}.json"))
    }

    /// Where an unreadable document for `user_id` is moved before a rewrite
    #[inline]
    #[must_use]
    pub fn quarantine_path_for(&self, user_id: &UserId) -> PathBuf {
        self.dir.join(format!("{user_id}.json.corrupt"))
    }

    async fn read_document(&self, user_id: &UserId) -> Result<Document, StoreError> {
        let path = self.path_for(user_id);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::Absent),
            Err(e) => return Err(StoreError::io_error(path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(Document::Absent);
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(doc) => Ok(decode_profile(user_id, doc).map_or(Document::Unreadable, Document::Readable)),
            Err(e) => {
                tracing::warn!("Malformed JSON in {}: {}", path.display(), e);
                Ok(Document::Unreadable)
            }
        }
    }
}

/// What is on disk for one user
enum Document {
    Absent,
    Readable(Profile),
    Unreadable,
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self, user_id: &UserId) -> Option<Profile> {
        match self.read_document(user_id).await {
            Ok(Document::Readable(profile)) => Some(profile),
            Ok(Document::Absent | Document::Unreadable) => None,
            Err(e) => {
                tracing::warn!("Cannot read profile {}: {}", user_id, e);
                None
            }
        }
    }

    async fn load_for_update(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        match self.read_document(user_id).await? {
            Document::Readable(profile) => Ok(Some(profile)),
            Document::Absent => Ok(None),
            Document::Unreadable => {
                let path = self.path_for(user_id);
                let aside = self.quarantine_path_for(user_id);
                tokio::fs::rename(&path, &aside)
                    .await
                    .map_err(|e| StoreError::io_error(&aside, e))?;
                tracing::warn!(
                    "Moved unreadable profile {} to {}",
                    path.display(),
                    aside.display()
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, user_id: &UserId, profile: &Profile) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io_error(&self.dir, e))?;

        let body = serde_json::to_string_pretty(profile)?;
        let path = self.path_for(user_id);
        let tmp = self.dir.join(format!("{user_id}.json.tmp"));

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io_error(&path, e))?;

        tracing::debug!("Saved profile {} to {}", user_id, path.display());
        Ok(())
    }
}

/// Turn a stored JSON document into a [`Profile`]
///
/// Drifted containers are repaired first (see [`schema::repair`]). A
/// document without `user_id` is attributed to `user_id`. Returns `None`
/// when the document still cannot be read as a profile.
#[must_use]
pub fn decode_profile(user_id: &UserId, mut doc: Value) -> Option<Profile> {
    let Value::Object(map) = &mut doc else {
        tracing::warn!("Profile document for {} is not an object", user_id);
        return None;
    };
    let stored_id_usable = map
        .get("user_id")
        .and_then(Value::as_str)
        .is_some_and(|raw| UserId::parse(raw).is_ok());
    if !stored_id_usable {
        map.insert("user_id".to_string(), Value::String(user_id.to_string()));
    }

    let repairs = schema::repair(&mut doc);
    if !repairs.is_empty() {
        tracing::warn!("Repaired {} drifted container(s) in profile {}", repairs.len(), user_id);
    }

    match serde_json::from_value::<Profile>(doc) {
        Ok(profile) => {
            if profile.user_id != *user_id {
                tracing::warn!(
                    "Profile stored under {} carries user_id {}",
                    user_id,
                    profile.user_id
                );
            }
            Some(profile)
        }
        Err(e) => {
            tracing::warn!("Unreadable profile for {}: {}", user_id, e);
            None
        }
    }
}
