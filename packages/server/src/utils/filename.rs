/// Longest sanitized file name used inside a blob key.
const MAX_KEY_FILE_NAME: usize = 100;

/// Result of validating an uploaded file name.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename is longer than 255 bytes.
    TooLong,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    PathTraversal,
    /// Filename contains control characters (CR, LF, NUL, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Filename must be at most 255 bytes",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates the file name of an uploaded image (no directory components).
///
/// The trimmed name is what gets stored as the image's display name.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.len() > 255 {
        return Err(FilenameError::TooLong);
    }

    // Also rejects NUL and CRLF, which would otherwise reach response headers.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == "." || trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    Ok(trimmed)
}

/// Reduces a validated file name to `[A-Za-z0-9._-]` for use as the last
/// segment of a blob key.
///
/// Runs of other characters collapse into one `_`, leading dots are dropped,
/// and the result keeps its extension when it has to be shortened.
pub fn sanitize_for_key(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for c in filename.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let out = out.trim_start_matches('.');
    if out.is_empty() || out.chars().all(|c| c == '_') {
        return "image".to_string();
    }

    if out.len() <= MAX_KEY_FILE_NAME {
        return out.to_string();
    }

    // ASCII only from here, so byte slicing is safe.
    match out.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < 16 => {
            let keep = MAX_KEY_FILE_NAME - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => out[..MAX_KEY_FILE_NAME].to_string(),
    }
}
