//! Container reading.
//!
//! The reader exposes raw member access and typed conveniences for the
//! well-known members. It performs no validation; hash and signature
//! checking live in [`crate::verification`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;
use zip::ZipArchive;

use evipack_core::{Manifest, StepRecord};

use crate::errors::ContainerError;
use crate::{ENVIRONMENT_MEMBER, MANIFEST_MEMBER, STEPS_MEMBER};

/// Reader for an existing container archive.
///
/// # Example
///
/// ```rust,no_run
/// use evipack_container::ContainerReader;
///
/// let mut reader = ContainerReader::open("out/session-1.epi")?;
/// let manifest = reader.manifest()?;
/// println!("{} steps", manifest.step_count);
/// # Ok::<(), evipack_container::ContainerError>(())
/// ```
pub struct ContainerReader {
    archive: ZipArchive<File>,
}

impl ContainerReader {
    /// Opens a container for reading.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if the file cannot be opened or is not a
    /// well-formed ZIP archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        Ok(Self { archive })
    }

    /// Lists member names in archive order.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(|n| n.to_string()).collect()
    }

    /// Returns whether a member with the given name is present.
    pub fn has_member(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Reads the raw bytes of one member.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::MissingMember`] if the member does not
    /// exist, or an I/O error if extraction fails.
    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>, ContainerError> {
        let mut member = match self.archive.by_name(name) {
            Ok(m) => m,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ContainerError::MissingMember(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::with_capacity(member.size() as usize);
        member.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads and parses the manifest member.
    pub fn manifest(&mut self) -> Result<Manifest, ContainerError> {
        let bytes = self.read_member(MANIFEST_MEMBER)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Reads and parses the event log, one step record per line.
    ///
    /// Blank lines are skipped; a malformed line is an error.
    pub fn steps(&mut self) -> Result<Vec<StepRecord>, ContainerError> {
        let bytes = self.read_member(STEPS_MEMBER)?;
        let text = String::from_utf8_lossy(&bytes);
        let mut steps = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            steps.push(serde_json::from_str(line)?);
        }
        Ok(steps)
    }

    /// Reads and parses the environment snapshot.
    pub fn environment(&mut self) -> Result<Value, ContainerError> {
        let bytes = self.read_member(ENVIRONMENT_MEMBER)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
