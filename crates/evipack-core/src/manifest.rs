//! Container manifest model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::canonical_bytes;
use crate::errors::CoreError;

/// Current container format version.
pub const FORMAT_VERSION: &str = "1";

/// Metadata record describing a container's contents, hashes, and signature.
///
/// Invariants:
/// - `step_count` equals the number of step records persisted in the
///   container's event log.
/// - `file_hashes` covers every non-manifest member present at write time.
/// - The signature, when present, covers [`Manifest::signing_bytes`], the
///   canonical encoding of this record with the `signature` field absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Container format version.
    pub format_version: String,
    /// Correlation id of the recorded session.
    pub session_id: String,
    /// Workflow label for the producing run.
    pub workflow_name: String,
    /// When the container was assembled (UTC).
    pub created_at: DateTime<Utc>,
    /// Number of step records in the event log.
    pub step_count: u64,
    /// Free-form labels attached by the producer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Optional statement of what the workflow set out to do.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Hex SHA-256 digest per non-manifest member, keyed by member name.
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,
    /// Hex Ed25519 signature over the canonical signing bytes, if signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Hex Ed25519 public key embedded for offline verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Additional domain metadata preserved verbatim for interoperability
    /// with containers produced by other tooling.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Manifest {
    /// Creates a manifest with the given identity fields and no hashes yet.
    pub fn new(session_id: impl Into<String>, workflow_name: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            session_id: session_id.into(),
            workflow_name: workflow_name.into(),
            created_at: Utc::now(),
            step_count: 0,
            tags: Vec::new(),
            goal: None,
            file_hashes: BTreeMap::new(),
            signature: None,
            public_key: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Returns the canonical bytes the signature covers.
    ///
    /// The manifest is serialized to JSON, the `signature` member is removed,
    /// and the remainder is canonicalized. Every other field, including
    /// `public_key`, participates, so mutating any of them invalidates an
    /// existing signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("signature");
        }
        Ok(canonical_bytes(&value)?)
    }
}
