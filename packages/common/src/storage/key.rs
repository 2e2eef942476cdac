use std::fmt;

use uuid::Uuid;

use super::error::StorageError;

/// Longest key accepted by any backend.
pub const MAX_KEY_LEN: usize = 512;

/// Relative, slash-separated location of a blob.
///
/// Keys never start with `/`, never contain `..` segments, backslashes or
/// control characters, so they can be joined onto a base directory or used
/// as an object name as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let invalid = |msg: &str| -> Result<Self, StorageError> {
            Err(StorageError::InvalidKey(format!("{msg}: {raw:?}")))
        };

        if raw.is_empty() {
            return invalid("empty key");
        }
        if raw.len() > MAX_KEY_LEN {
            return invalid("key too long");
        }
        if raw.starts_with('/') {
            return invalid("absolute key");
        }
        if raw.contains('\\') {
            return invalid("backslash in key");
        }
        if raw.chars().any(char::is_control) {
            return invalid("control character in key");
        }
        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return invalid("empty or relative segment");
        }

        Ok(Self(raw.to_string()))
    }

    /// Key for an uploaded portfolio image:
    /// `portfolio-<id>/<unix millis>-<file name>`.
    ///
    /// `file_name` must already be reduced to a single safe segment.
    pub fn for_image(
        portfolio_id: Uuid,
        uploaded_at_millis: i64,
        file_name: &str,
    ) -> Result<Self, StorageError> {
        Self::parse(&format!(
            "portfolio-{portfolio_id}/{uploaded_at_millis}-{file_name}"
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
