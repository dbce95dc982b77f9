use thiserror::Error;

/// Errors that can occur during container read or write operations.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The archive is structurally invalid or a member operation failed.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Core primitive failure (canonicalization, signing, key material).
    #[error(transparent)]
    Core(#[from] evipack_core::CoreError),
    /// A required member is not present in the archive.
    #[error("missing container member: {0}")]
    MissingMember(String),
    /// The finished archive could not be moved into its target path.
    #[error("failed to publish container: {0}")]
    Publish(String),
}
