//! Platform user directory
//!
//! Loaded from disk at most once, read-only afterwards. A fresh read only
//! happens through an explicit [`PlatformDirectory::reload`].

use lps_profile::{parse_users, PlatformUser};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lazily loaded list of platform users
#[derive(Debug)]
pub struct PlatformDirectory {
    source: Option<PathBuf>,
    users: RwLock<Option<Arc<[PlatformUser]>>>,
    loads: AtomicUsize,
}

impl PlatformDirectory {
    /// Directory backed by the JSON export at `path`
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            users: RwLock::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// Directory with a fixed set of users and no backing file
    #[must_use]
    pub fn from_users(users: Vec<PlatformUser>) -> Self {
        Self {
            source: None,
            users: RwLock::new(Some(users.into())),
            loads: AtomicUsize::new(0),
        }
    }

    /// Directory that knows no users
    #[must_use]
    pub fn empty() -> Self {
        Self::from_users(Vec::new())
    }

    /// Backing file, if any
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of times the backing file was read
    #[inline]
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// All users, loading them on first use
    pub async fn users(&self) -> Arc<[PlatformUser]> {
        if let Some(users) = self.users.read().await.as_ref() {
            return Arc::clone(users);
        }

        let mut slot = self.users.write().await;
        if let Some(users) = slot.as_ref() {
            return Arc::clone(users);
        }
        let users = self.read_source().await;
        *slot = Some(Arc::clone(&users));
        users
    }

    /// Find the user whose id or e-mail equals `key`
    pub async fn find(&self, key: &str) -> Option<PlatformUser> {
        self.users()
            .await
            .iter()
            .find(|user| user.matches(key))
            .cloned()
    }

    /// Re-read the backing file, replacing the loaded users
    ///
    /// Returns the number of users now known. A directory without a backing
    /// file keeps its users.
    pub async fn reload(&self) -> usize {
        if self.source.is_none() {
            return self.users().await.len();
        }
        let users = self.read_source().await;
        let count = users.len();
        *self.users.write().await = Some(users);
        count
    }

    async fn read_source(&self) -> Arc<[PlatformUser]> {
        let Some(path) = &self.source else {
            return Arc::from(Vec::new());
        };
        self.loads.fetch_add(1, Ordering::Relaxed);

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No platform users file at {}", path.display());
                return Arc::from(Vec::new());
            }
            Err(e) => {
                tracing::warn!("Cannot read platform users {}: {}", path.display(), e);
                return Arc::from(Vec::new());
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(root) => {
                let users = parse_users(root);
                tracing::info!("Loaded {} platform users from {}", users.len(), path.display());
                users.into()
            }
            Err(e) => {
                tracing::warn!("Malformed platform users file {}: {}", path.display(), e);
                Arc::from(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn loads_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, json!([{"id": 1, "email": "a@x", "name": "A"}]).to_string()).unwrap();

        let directory = PlatformDirectory::from_file(&path);
        assert_eq!(directory.load_count(), 0);

        assert_eq!(directory.find("1").await.unwrap().name.as_deref(), Some("A"));
        assert!(directory.find("a@x").await.is_some());
        assert!(directory.find("2").await.is_none());
        assert_eq!(directory.load_count(), 1);
    }

    #[tokio::test]
    async fn reload_is_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, json!([{"id": 1}]).to_string()).unwrap();

        let directory = PlatformDirectory::from_file(&path);
        assert_eq!(directory.users().await.len(), 1);

        std::fs::write(&path, json!({"a": {"id": 1}, "b": {"id": 2}}).to_string()).unwrap();
        assert_eq!(directory.users().await.len(), 1);

        assert_eq!(directory.reload().await, 2);
        assert_eq!(directory.load_count(), 2);
    }

    #[tokio::test]
    async fn missing_or_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = PlatformDirectory::from_file(dir.path().join("none.json"));
        assert!(missing.users().await.is_empty());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{oops").unwrap();
        assert!(PlatformDirectory::from_file(&bad).users().await.is_empty());
    }

    #[tokio::test]
    async fn fixed_users() {
        let directory = PlatformDirectory::from_users(vec![PlatformUser {
            email: Some("z@x".into()),
            ..PlatformUser::default()
        }]);
        assert!(directory.find("z@x").await.is_some());
        assert_eq!(directory.reload().await, 1);
        assert_eq!(directory.load_count(), 0);
        assert!(PlatformDirectory::empty().users().await.is_empty());
    }
}
