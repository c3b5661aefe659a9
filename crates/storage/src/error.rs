//! Error types for the storage crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for storage operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Descriptor, codec or configuration error from the core crate
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] pixstore_core::Error),

    /// I/O error during storage operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(pixstore::storage::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "rename")
        operation: String,
    },

    /// The no-image placeholder could not be materialized
    #[error("could not create the no-image placeholder: {} does not exist or is not writable", path.display())]
    #[diagnostic(
        code(pixstore::storage::no_image_unwritable),
        help("The originals root must be writable so the placeholder can be created on first use")
    )]
    NoImageUnwritable {
        /// Directory that was missing or unwritable
        path: Box<Path>,
    },
}

impl Error {
    /// Create an I/O error with path context
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a no-image-unwritable error
    #[must_use]
    pub fn no_image_unwritable(path: impl AsRef<Path>) -> Self {
        Self::NoImageUnwritable {
            path: path.as_ref().into(),
        }
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;
