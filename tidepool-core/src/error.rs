//! Error types for the Tidepool core crate.

use std::fmt;

/// Top-level error type for tidepool-core operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    /// Serialization or deserialization failed.
    Serialization(SerializationError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Serialization(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<SerializationError> for CoreError {
    fn from(e: SerializationError) -> Self {
        CoreError::Serialization(e)
    }
}

/// Errors related to serialization and deserialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to encode data to bytes.
    EncodeFailed(String),
    /// Failed to decode data from bytes.
    DecodeFailed(String),
    /// The snapshot does not start with the expected magic bytes.
    BadMagic,
    /// The snapshot was written by an unsupported format version.
    UnsupportedVersion(u16),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationError::EncodeFailed(msg) => write!(f, "encode failed: {}", msg),
            SerializationError::DecodeFailed(msg) => write!(f, "decode failed: {}", msg),
            SerializationError::BadMagic => write!(f, "not a tidepool snapshot"),
            SerializationError::UnsupportedVersion(v) => {
                write!(f, "unsupported snapshot version {}", v)
            }
        }
    }
}

impl std::error::Error for SerializationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = CoreError::Serialization(SerializationError::EncodeFailed("test".into()));
        assert!(e.to_string().contains("encode failed"));

        let e = SerializationError::UnsupportedVersion(9);
        assert!(e.to_string().contains("version 9"));
    }

    #[test]
    fn test_error_conversion() {
        let core_err: CoreError = SerializationError::BadMagic.into();
        assert!(matches!(core_err, CoreError::Serialization(SerializationError::BadMagic)));
    }
}
