// yrini/src/error.rs

//! Fatal error types for reading, composing and writing INI documents.
//!
//! Anything that should not abort a read (dangling parents, cycles, missing
//! includes, odd lines) is a [`Diagnostic`](crate::diagnostic::Diagnostic)
//! instead and never shows up here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for yrini operations.
pub type Result<T> = std::result::Result<T, IniError>;

/// Errors that abort an operation.
#[derive(Error, Debug)]
pub enum IniError {
    /// I/O error on an explicitly requested file (single read, tree root, write target)
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Autodetected encoding and the GBK fallback both failed
    #[error("unable to decode {} (tried {encoding}, then GBK)", .path.display())]
    Decode { path: PathBuf, encoding: String },

    /// Text contains characters the requested output encoding cannot represent
    #[error("unable to encode {} as {encoding}", .path.display())]
    Encode { path: PathBuf, encoding: String },

    /// Key is not visible in a section, neither as an own pair nor through inheritance
    #[error("key '{key}' not found in [{section}]")]
    KeyNotFound { section: String, key: String },

    /// Section is not declared in the document
    #[error("section [{0}] not found")]
    SectionNotFound(String),

    /// File already exists (when force=false)
    #[error("file already exists: {}", .0.display())]
    FileAlreadyExists(PathBuf),

    /// Dedicated loader thread pool could not be built
    #[error("unable to build loader thread pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// JSON serialization/deserialization error
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IniError {
    /// Create a key lookup error.
    pub fn key_not_found<S: Into<String>, K: Into<String>>(section: S, key: K) -> Self {
        IniError::KeyNotFound {
            section: section.into(),
            key: key.into(),
        }
    }

    /// Create a decode error naming the offending file.
    pub fn decode<P: Into<PathBuf>>(path: P, encoding: &'static encoding_rs::Encoding) -> Self {
        IniError::Decode {
            path: path.into(),
            encoding: encoding.name().to_string(),
        }
    }

    /// Get the error category as a string.
    pub fn category(&self) -> &'static str {
        match self {
            IniError::Io(_) => "io",
            IniError::Decode { .. } | IniError::Encode { .. } => "encoding",
            IniError::KeyNotFound { .. } | IniError::SectionNotFound(_) => "lookup",
            IniError::FileAlreadyExists(_) => "io",
            IniError::WorkerPool(_) => "concurrency",
            #[cfg(feature = "json")]
            IniError::Json(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IniError::key_not_found("GACNST", "Strength");
        assert_eq!(err.to_string(), "key 'Strength' not found in [GACNST]");

        let err = IniError::decode("rulesmd.ini", encoding_rs::UTF_8);
        assert!(err.to_string().contains("rulesmd.ini"));
        assert!(err.to_string().contains("UTF-8"));

        let err = IniError::SectionNotFound("E1".to_string());
        assert_eq!(err.to_string(), "section [E1] not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing.ini");
        let err: IniError = io_err.into();
        assert!(matches!(err, IniError::Io(_)));
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(IniError::key_not_found("A", "b").category(), "lookup");
        assert_eq!(
            IniError::decode("a.ini", encoding_rs::GBK).category(),
            "encoding"
        );
        assert_eq!(
            IniError::FileAlreadyExists(PathBuf::from("out.ini")).category(),
            "io"
        );
    }
}
