use thiserror::Error;

/// Core error types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization of signing bytes failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] crate::canonical::CanonicalizationError),
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A hex-encoded key or signature could not be decoded.
    #[error("invalid {field}: {reason}")]
    InvalidKeyMaterial {
        /// Which field was malformed ("signing key", "public key", "signature").
        field: &'static str,
        /// Why decoding failed.
        reason: String,
    },
    /// Identifier validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Validation error for identifier newtypes.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Value did not match the required pattern.
    #[error("{field} does not match required pattern: {value:?}")]
    PatternMismatch {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}
