//! Error types for tag conversion and metadata access.

/// Error type returned by the tag model and the metadata container.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A raw value does not match its type grammar, or a native value has the
    /// wrong shape or range for the target type.
    #[error("Invalid value for {target}: {value:?}")]
    Conversion { target: String, value: String },

    /// The key does not exist in the image or in the tag registry.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The key is malformed or belongs to no known family.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A tag was assigned under a key other than its own.
    #[error("Tag key {found} does not match {expected}")]
    KeyMismatch { expected: String, found: String },

    /// A tag of the wrong family, or a value of the wrong structural kind.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The metadata has not been loaded yet.
    #[error("Metadata not loaded")]
    NotLoaded,

    /// Reading or writing the underlying resource failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A metadata snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl Error {
    /// Create a new Conversion error.
    pub fn conversion<T: Into<String>, V: Into<String>>(target: T, value: V) -> Self {
        Self::Conversion {
            target: target.into(),
            value: value.into(),
        }
    }

    /// Create a new KeyNotFound error.
    pub fn key_not_found<S: Into<String>>(key: S) -> Self {
        Self::KeyNotFound(key.into())
    }

    /// Create a new TypeMismatch error.
    pub fn type_mismatch<S: Into<String>>(msg: S) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// True for the errors a dictionary lookup reports as a missing key.
    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::KeyNotFound(_) | Self::InvalidKey(_))
    }

    /// True for raw/native conversion failures.
    pub fn is_conversion_error(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// True for wrong-family and wrong-shape errors.
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::TypeMismatch(_))
    }
}

/// Result type alias using the crate Error type.
pub type Result<T> = std::result::Result<T, Error>;
