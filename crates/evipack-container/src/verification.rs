//! Integrity verification and batch policy evaluation.
//!
//! Verification never raises past this boundary: every failure mode is
//! encoded in the [`VerificationReport`] so a batch run can continue past
//! one bad file. Results are computed fresh on every call and never cached.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use evipack_core::{sha256_hex, verify_manifest, Manifest, SignatureCheck};

use crate::reader::ContainerReader;
use crate::{CONTAINER_EXTENSION, MANIFEST_MEMBER, STEPS_MEMBER};

/// Trust classification for a single container.
///
/// Fields mirror the order of checks: archive validity, manifest presence,
/// signature state, member hashes, event-log presence. `tampered` is the
/// rollup consumers act on; `error` records the first hard failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    /// Path of the container that was checked.
    pub path: PathBuf,
    /// Whether the file is a well-formed ZIP archive.
    pub valid_archive: bool,
    /// Whether `manifest.json` is present.
    pub has_manifest: bool,
    /// Whether `steps.jsonl` is present. Absence is reported but is not by
    /// itself tampering.
    pub has_steps: bool,
    /// Whether the manifest carries a signature.
    pub signed: bool,
    /// Signature check outcome: `Some(true)` valid, `Some(false)` invalid,
    /// `None` when unsigned or indeterminate (signed but no usable key).
    pub signature_valid: Option<bool>,
    /// Whether any integrity check failed.
    pub tampered: bool,
    /// First failure (or advisory note) encountered, if any.
    pub error: Option<String>,
}

impl VerificationReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            valid_archive: false,
            has_manifest: false,
            has_steps: false,
            signed: false,
            signature_valid: None,
            tampered: false,
            error: None,
        }
    }

    /// Whether this container is fully verified: intact and carrying a
    /// valid signature.
    pub fn is_verified(&self) -> bool {
        !self.tampered && self.signed && self.signature_valid == Some(true)
    }

    /// Whether this container is intact but unsigned.
    pub fn is_unsigned(&self) -> bool {
        !self.tampered && !self.signed
    }
}

/// Verifies a single container using the public key embedded in its
/// manifest, if any.
pub fn verify_container(path: impl AsRef<Path>) -> VerificationReport {
    verify_container_with_key(path, None)
}

/// Verifies a single container, preferring `external_key_hex` over the
/// manifest's embedded public key when supplied.
pub fn verify_container_with_key(
    path: impl AsRef<Path>,
    external_key_hex: Option<&str>,
) -> VerificationReport {
    let path = path.as_ref();
    let mut report = VerificationReport::new(path);

    let mut reader = match ContainerReader::open(path) {
        Ok(reader) => reader,
        Err(_) => {
            report.tampered = true;
            report.error = Some("not a valid archive".to_string());
            return report;
        }
    };
    report.valid_archive = true;
    report.has_steps = reader.has_member(STEPS_MEMBER);

    if !reader.has_member(MANIFEST_MEMBER) {
        report.tampered = true;
        report.error = Some("missing manifest".to_string());
        return report;
    }
    report.has_manifest = true;

    let manifest: Manifest = match reader.manifest() {
        Ok(m) => m,
        Err(e) => {
            report.tampered = true;
            report.error = Some(format!("manifest parse error: {e}"));
            return report;
        }
    };

    match verify_manifest(&manifest, external_key_hex) {
        SignatureCheck::Unsigned => {}
        SignatureCheck::Valid => {
            report.signed = true;
            report.signature_valid = Some(true);
        }
        SignatureCheck::Invalid(reason) => {
            report.signed = true;
            report.signature_valid = Some(false);
            report.tampered = true;
            report.error = Some(reason);
        }
        SignatureCheck::Indeterminate(note) => {
            // Signed but unverifiable is reported, not treated as tampering.
            report.signed = true;
            report.signature_valid = None;
            report.error = Some(note);
        }
    }

    // Only the first hard failure is recorded; once tampered, further hash
    // checks are skipped.
    for (name, expected) in &manifest.file_hashes {
        if report.tampered {
            break;
        }
        if !reader.has_member(name) {
            continue;
        }
        let actual = match reader.read_member(name) {
            Ok(bytes) => sha256_hex(&bytes),
            Err(e) => {
                report.tampered = true;
                report.error = Some(format!("cannot read member {name}: {e}"));
                break;
            }
        };
        if &actual != expected {
            report.tampered = true;
            report.error = Some(format!("hash mismatch: {name}"));
            break;
        }
    }

    report
}

/// Recursively discovers candidate containers under `path`.
///
/// A file path is a candidate when it carries the `.epi` extension; a
/// directory is walked recursively. Results are sorted for stable output.
pub fn discover_containers(path: impl AsRef<Path>) -> Vec<PathBuf> {
    let path = path.as_ref();
    let mut found = Vec::new();

    if path.is_file() {
        if has_container_extension(path) {
            found.push(path.to_path_buf());
        }
        return found;
    }

    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && has_container_extension(entry.path()) {
            found.push(entry.path().to_path_buf());
        }
    }
    found.sort();
    found
}

fn has_container_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == CONTAINER_EXTENSION)
        .unwrap_or(false)
}

/// Policy flags controlling whether a batch verification passes.
///
/// A tampered container is always *reported* tampered regardless of policy;
/// the flags only decide pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Fail the batch when any container is tampered (default: on).
    pub fail_on_tampered: bool,
    /// Fail the batch when any container is unsigned (default: off).
    pub fail_on_unsigned: bool,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            fail_on_tampered: true,
            fail_on_unsigned: false,
        }
    }
}

/// Aggregated outcome of verifying every container under a path.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    /// Number of containers checked.
    pub total: usize,
    /// Intact containers with a valid (or at least present, untampered)
    /// signature.
    pub verified: usize,
    /// Containers failing any integrity check.
    pub tampered: usize,
    /// Intact containers with no signature.
    pub unsigned: usize,
    /// Per-container reports, in discovery order.
    pub reports: Vec<VerificationReport>,
}

impl VerificationSummary {
    /// Applies the policy flags to decide pass/fail.
    pub fn passes(&self, policy: &VerificationPolicy) -> bool {
        if policy.fail_on_tampered && self.tampered > 0 {
            return false;
        }
        if policy.fail_on_unsigned && self.unsigned > 0 {
            return false;
        }
        true
    }
}

/// Discovers and verifies every container under `path`.
pub fn verify_path(path: impl AsRef<Path>, external_key_hex: Option<&str>) -> VerificationSummary {
    let reports: Vec<VerificationReport> = discover_containers(path)
        .iter()
        .map(|p| verify_container_with_key(p, external_key_hex))
        .collect();

    let total = reports.len();
    let tampered = reports.iter().filter(|r| r.tampered).count();
    let unsigned = reports.iter().filter(|r| r.is_unsigned()).count();
    let verified = total - tampered - unsigned;

    VerificationSummary {
        total,
        verified,
        tampered,
        unsigned,
        reports,
    }
}
