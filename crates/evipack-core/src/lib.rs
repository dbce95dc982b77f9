//! Canonical data model primitives for evipack evidence containers.
//!
//! Every field that participates in hashing, signing, or verification lives
//! in this crate: step records, the container manifest, the deterministic
//! manifest encoding used for signatures, SHA-256 digest helpers, and the
//! Ed25519 trust operations.
//!
//! Core invariants:
//! - Step records are immutable, append-only evidence.
//! - The manifest signature covers the canonical bytes of the manifest with
//!   the `signature` field absent; sign and verify must produce identical
//!   bytes or signatures spuriously fail.
//! - Verification is deterministic and offline.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic signing bytes.
pub mod canonical;
/// SHA-256 digest helpers for container members.
pub mod digest;
/// Error types for core operations.
pub mod errors;
/// Validated identifier newtypes.
pub mod identifiers;
/// Container manifest model.
pub mod manifest;
/// Step record data model.
pub mod step;
/// Ed25519 signing and verification of manifests.
pub mod trust;

pub use canonical::{canonical_bytes, CanonicalizationError};
pub use digest::sha256_hex;
pub use errors::{CoreError, ValidationError};
pub use identifiers::{SessionId, WorkflowName};
pub use manifest::{Manifest, FORMAT_VERSION};
pub use step::StepRecord;
pub use trust::{sign_manifest, verify_manifest, Keypair, SignatureCheck};
