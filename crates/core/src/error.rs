//! Error types for pixstore-core

use miette::Diagnostic;
use thiserror::Error;

/// Error type for descriptor and configuration operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A size spec was missing its width or height
    #[error("invalid size spec `{spec}`: both width and height are required")]
    #[diagnostic(
        code(pixstore::core::size_spec),
        help("Size specs look like `800x600` or `800x600crop10x10x200x200`")
    )]
    SizeSpec {
        /// The offending size spec
        spec: String,
    },

    /// A resize-mode token did not name a known mode
    #[error("unknown transform mode `{flag}`")]
    #[diagnostic(
        code(pixstore::core::unknown_transform_mode),
        help("Known modes: fit, shrink_only, stretch, fill, exact (combine with `+`)")
    )]
    UnknownTransformMode {
        /// The token that failed to resolve
        flag: String,
    },

    /// A file name to be stored carried no extension
    #[error("cannot determine file extension of `{name}`")]
    #[diagnostic(code(pixstore::core::missing_extension))]
    MissingExtension {
        /// The sanitized name that lacked an extension
        name: String,
    },

    /// An identifier did not match the expected path grammar
    #[error("malformed asset identifier `{identifier}`")]
    #[diagnostic(
        code(pixstore::core::malformed_identifier),
        help("Identifiers look like `namespace/ab/name.ext`")
    )]
    MalformedIdentifier {
        /// The identifier that failed to parse
        identifier: String,
    },

    /// Configuration or descriptor-invariant violation
    #[error("configuration error: {message}")]
    #[diagnostic(code(pixstore::core::config))]
    Configuration {
        /// Description of the violated constraint
        message: String,
    },
}

impl Error {
    /// Create a size-spec error
    #[must_use]
    pub fn size_spec(spec: impl Into<String>) -> Self {
        Self::SizeSpec { spec: spec.into() }
    }

    /// Create an unknown-transform-mode error
    #[must_use]
    pub fn unknown_transform_mode(flag: impl Into<String>) -> Self {
        Self::UnknownTransformMode { flag: flag.into() }
    }

    /// Create a missing-extension error
    #[must_use]
    pub fn missing_extension(name: impl Into<String>) -> Self {
        Self::MissingExtension { name: name.into() }
    }

    /// Create a malformed-identifier error
    #[must_use]
    pub fn malformed_identifier(identifier: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
