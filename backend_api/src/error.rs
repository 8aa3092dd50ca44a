//! Backend error channel
//!
//! The Rust rendition of the POSIX "last error code" channel: every
//! primitive reports failure as a standard code plus the backend's
//! native error text.

use core::fmt;

/// Standard backend failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Entry does not exist
    NotFound,
    /// Entry already exists
    AlreadyExists,
    /// A path component that must be a directory is not one
    NotADirectory,
    /// The entry is a directory where a file was required
    IsADirectory,
    /// Directory removal attempted on a non-empty directory
    DirectoryNotEmpty,
    /// Descriptor is not open
    BadDescriptor,
    /// Path exceeds the backend's length bound
    TooLong,
    /// Any other backend failure
    Other,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::NotADirectory => write!(f, "not a directory"),
            Self::IsADirectory => write!(f, "is a directory"),
            Self::DirectoryNotEmpty => write!(f, "directory not empty"),
            Self::BadDescriptor => write!(f, "bad descriptor"),
            Self::TooLong => write!(f, "path too long"),
            Self::Other => write!(f, "backend error"),
        }
    }
}

/// A backend primitive failure: standard code plus native error text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// Standard failure code
    pub code: ErrorCode,
    /// Backend-native error text
    pub message: String,
}

impl BackendError {
    /// Creates an error with an explicit message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an error whose message is the code's standard text
    pub fn code(code: ErrorCode) -> Self {
        Self {
            message: code.to_string(),
            code,
        }
    }

    /// Convenience constructor for the not-found code
    pub fn not_found(path: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("no such entry: {}", path))
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_constructor_uses_standard_text() {
        let err = BackendError::code(ErrorCode::NotADirectory);
        assert_eq!(err.code, ErrorCode::NotADirectory);
        assert_eq!(err.to_string(), "not a directory");
    }

    #[test]
    fn test_not_found_names_path() {
        let err = BackendError::not_found("/a/b");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("/a/b"));
    }
}
