use thiserror::Error;

/// Errors that can occur while recording or persisting evidence.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Processing one queued evidence item failed. Caught and logged by the
    /// worker loop; never terminates consumption.
    #[error("failed to persist evidence item: {0}")]
    WorkerItem(#[from] evipack_container::ContainerError),
    /// A correlation id unfit for container metadata was rejected.
    #[error("invalid correlation id: {0}")]
    CorrelationId(#[from] evipack_core::ValidationError),
}
