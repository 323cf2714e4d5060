//! Document identifiers and version numbers.

use serde::{Deserialize, Serialize};

use super::errors::DocumentError;
use crate::constants::MAX_DOCUMENT_ID_LEN;

/// Monotonic per-document version number. New documents start at 0.
pub type Version = u64;

/// Identifier of a document.
///
/// Non-empty, at most [`MAX_DOCUMENT_ID_LEN`] bytes, with no control
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, DocumentError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DocumentError::InvalidId {
                id,
                reason: "must not be empty".to_string(),
            });
        }
        if id.len() > MAX_DOCUMENT_ID_LEN {
            return Err(DocumentError::InvalidId {
                reason: format!("longer than {MAX_DOCUMENT_ID_LEN} bytes"),
                id,
            });
        }
        if id.chars().any(char::is_control) {
            return Err(DocumentError::InvalidId {
                id,
                reason: "contains control characters".to_string(),
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for DocumentId {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for DocumentId {
    type Error = DocumentError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for DocumentId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<&str> for DocumentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl Serialize for DocumentId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DocumentId::new(s).map_err(serde::de::Error::custom)
    }
}
