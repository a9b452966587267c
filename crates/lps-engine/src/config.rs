//! Engine configuration

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of all persisted state
    pub data_dir: PathBuf,
    /// Profile documents directory, relative to `data_dir`
    pub profiles_dir: PathBuf,
    /// Platform users export, relative to `data_dir`
    pub users_file: PathBuf,
    /// Maximum cached profiles
    pub cache_capacity: u64,
    /// Cache entry lifetime in seconds
    pub cache_ttl_secs: u64,
    /// Derive updates from reply keywords when the model sends none
    pub infer_from_reply: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] on malformed TOML or mistyped keys.
    pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
        toml::from_str(raw).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// With data directory
    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// With profiles directory
    #[inline]
    #[must_use]
    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = dir.into();
        self
    }

    /// With platform users file
    #[inline]
    #[must_use]
    pub fn with_users_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.users_file = file.into();
        self
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }

    /// With reply keyword inference
    #[inline]
    #[must_use]
    pub fn with_infer_from_reply(mut self, enabled: bool) -> Self {
        self.infer_from_reply = enabled;
        self
    }

    /// Directory holding `<user_id>.json` documents
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join(&self.profiles_dir)
    }

    /// Path of the platform users export
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    /// Cache entry lifetime
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            profiles_dir: PathBuf::from("user_profile"),
            users_file: PathBuf::from("users.json"),
            cache_capacity: 1024,
            cache_ttl_secs: 300,
            infer_from_reply: false,
        }
    }
}
