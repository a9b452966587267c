//! User identifiers
//!
//! A [`UserId`] addresses one profile document on disk, so it is validated
//! once at the boundary and trusted everywhere else.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Maximum accepted identifier length in bytes
pub const MAX_USER_ID_LEN: usize = 128;

/// Stable identifier of a profile owner
///
/// Ids coming from the platform may be numeric ids or e-mail addresses, so
/// the accepted alphabet is wide; only characters that could escape the
/// profile directory are refused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parse and validate an identifier
    ///
    /// Surrounding whitespace is trimmed first.
    ///
    /// # Errors
    /// Returns [`UserIdError`] if the id is empty, too long, or contains
    /// path separators, `..` or control characters.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, UserIdError> {
        let id = raw.as_ref().trim();

        if id.is_empty() {
            return Err(UserIdError::Empty);
        }
        if id.len() > MAX_USER_ID_LEN {
            return Err(UserIdError::TooLong(id.len()));
        }
        if id.contains("..") {
            return Err(UserIdError::InvalidCharacters(id.to_string()));
        }
        if id
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
        {
            return Err(UserIdError::InvalidCharacters(id.to_string()));
        }

        Ok(Self(id.to_string()))
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    /// Blank identifier
    #[error("user id is empty")]
    Empty,

    /// Identifier longer than [`MAX_USER_ID_LEN`]
    #[error("user id is too long ({0} bytes)")]
    TooLong(usize),

    /// Identifier could escape the storage directory
    #[error("user id contains invalid characters: '{0}'")]
    InvalidCharacters(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_and_email_ids() {
        assert_eq!(UserId::parse("42").unwrap().as_str(), "42");
        assert_eq!(
            UserId::parse("  ana@example.com ").unwrap().as_str(),
            "ana@example.com"
        );
    }

    #[test]
    fn rejects_traversal() {
        assert!(matches!(
            UserId::parse("../etc/passwd"),
            Err(UserIdError::InvalidCharacters(_))
        ));
        assert!(UserId::parse("a\\b").is_err());
        assert!(UserId::parse("..").is_err());
    }

    #[test]
    fn rejects_empty_and_long() {
        assert_eq!(UserId::parse("   "), Err(UserIdError::Empty));
        let long = "x".repeat(MAX_USER_ID_LEN + 1);
        assert!(matches!(UserId::parse(long), Err(UserIdError::TooLong(_))));
    }

    #[test]
    fn serde_validates() {
        let ok: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(ok.to_string(), "u1");
        assert!(serde_json::from_str::<UserId>("\"a/b\"").is_err());
    }
}
