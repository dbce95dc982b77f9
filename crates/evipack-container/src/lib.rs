//! Archive codec and integrity verifier for `.epi` evidence containers.
//!
//! A container is a ZIP archive with a fixed member layout:
//! - `mimetype`: the media-type marker, stored uncompressed as the first
//!   member so format sniffers can read it without inflating anything.
//! - `manifest.json`: metadata, member hashes, and optional signature.
//! - `steps.jsonl`: the ordered event log, one step record per line.
//! - `environment.json`: snapshot of the producing environment.
//!
//! Writing is atomic (temp file + rename) so a partially written container
//! is never visible at the target path. Containers are immutable after
//! creation; the verifier only ever reads.
//!
#![deny(missing_docs)]

/// Error types for container operations.
pub mod errors;
/// Container reading (raw member access, no validation).
pub mod reader;
/// Integrity verification and batch policy evaluation.
pub mod verification;
/// Container assembly and atomic publishing.
pub mod writer;

pub use errors::ContainerError;
pub use reader::ContainerReader;
pub use verification::{
    discover_containers, verify_container, verify_container_with_key, verify_path,
    VerificationPolicy, VerificationReport, VerificationSummary,
};
pub use writer::ContainerBuilder;

/// Media-type string stored in the `mimetype` member.
pub const MEDIA_TYPE: &str = "application/x-evipack+zip";
/// File extension for containers.
pub const CONTAINER_EXTENSION: &str = "epi";
/// Name of the media-type marker member.
pub const MIMETYPE_MEMBER: &str = "mimetype";
/// Name of the manifest member.
pub const MANIFEST_MEMBER: &str = "manifest.json";
/// Name of the event-log member.
pub const STEPS_MEMBER: &str = "steps.jsonl";
/// Name of the environment snapshot member.
pub const ENVIRONMENT_MEMBER: &str = "environment.json";
