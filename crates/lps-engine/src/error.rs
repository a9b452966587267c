//! Error types for the profile engine

use lps_patch::ValidationReport;
use lps_profile::UserIdError;
use lps_store::StoreError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Caller supplied an unusable user id
    #[error("invalid user id: {0}")]
    InvalidUserId(#[from] UserIdError),

    /// Patch was rejected; nothing was written
    #[error("patch rejected: {}", .0.messages().join("; "))]
    Validation(ValidationReport),

    /// Merged profile could not be persisted; the stored profile is unchanged
    #[error("storage failed: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Check if the caller's patch was at fault
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if persistence failed
    #[inline]
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Validation messages, empty for other errors
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(report) => report.messages(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lps_patch::PatchError;

    #[test]
    fn classification() {
        let rejected = EngineError::Validation(ValidationReport {
            sanitized: None,
            errors: vec![PatchError::UnknownKey("admin".into())],
        });
        assert!(rejected.is_validation());
        assert!(!rejected.is_storage());
        assert_eq!(rejected.messages().len(), 1);
        assert!(rejected.to_string().contains("admin"));

        let failed = EngineError::from(StoreError::Backend("disk full".into()));
        assert!(failed.is_storage());
        assert!(failed.messages().is_empty());
    }
}
