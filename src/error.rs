//! Error types for dataset operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while building or reading a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Image, annotation, or image folder is absent
    #[error("File not found: {path:?}")]
    NotFound {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// Malformed annotation XML or missing expected elements
    #[error("Failed to parse {path:?}: {message}")]
    Parse {
        /// Annotation file being parsed
        path: PathBuf,
        /// Description of the parse failure
        message: String,
    },

    /// Index outside `[0, len)`
    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of examples available
        len: usize,
    },

    /// I/O error other than a missing file
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// Path involved in the failing operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Image bytes could not be decoded
    #[error("Failed to decode image {path:?}: {source}")]
    Image {
        /// Image file being decoded
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// A transform stage rejected its input
    #[error("Transform failed: {message}")]
    Transform {
        /// Description of the transform failure
        message: String,
    },
}

impl DatasetError {
    /// Classify an I/O error on `path`, separating missing files from other failures.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Create a parse error for an annotation file.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transform error with a message.
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Whether this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
