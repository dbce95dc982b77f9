//! Container assembly and atomic publishing.

use std::io::Write;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use evipack_core::{sha256_hex, sign_manifest, Keypair, Manifest, SessionId, StepRecord, WorkflowName};

use crate::errors::ContainerError;
use crate::{ENVIRONMENT_MEMBER, MANIFEST_MEMBER, MEDIA_TYPE, MIMETYPE_MEMBER, STEPS_MEMBER};

/// Builder that assembles an evidence group plus metadata into a container.
///
/// # Example
///
/// ```rust,no_run
/// use evipack_container::ContainerBuilder;
/// use evipack_core::{SessionId, StepRecord, WorkflowName};
/// use serde_json::json;
///
/// let manifest = ContainerBuilder::new(
///     SessionId::parse("session-1")?,
///     WorkflowName::parse("demo-workflow")?,
/// )
/// .step(StepRecord::new("llm.request", json!({"model": "m-1"})))
/// .tag("ci")
/// .write("out/session-1.epi", None)?;
/// assert_eq!(manifest.step_count, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ContainerBuilder {
    session_id: String,
    workflow_name: String,
    tags: Vec<String>,
    goal: Option<String>,
    steps: Vec<StepRecord>,
    environment: Value,
    extra_members: Vec<(String, Vec<u8>)>,
}

impl ContainerBuilder {
    /// Creates a builder for the given session and workflow.
    ///
    /// Taking the validated identifier types keeps unvetted strings out of
    /// manifest fields and container filenames; the builder itself never
    /// fails on identity.
    pub fn new(session_id: SessionId, workflow_name: WorkflowName) -> Self {
        Self {
            session_id: session_id.into_string(),
            workflow_name: workflow_name.into_string(),
            tags: Vec::new(),
            goal: None,
            steps: Vec::new(),
            environment: json!({}),
            extra_members: Vec::new(),
        }
    }

    /// Appends one step record to the event log.
    pub fn step(mut self, step: StepRecord) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a batch of step records, preserving their order.
    pub fn steps(mut self, steps: impl IntoIterator<Item = StepRecord>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Attaches a free-form label to the manifest.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Records what the workflow set out to do.
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    /// Sets the environment snapshot written to `environment.json`.
    pub fn environment(mut self, environment: Value) -> Self {
        self.environment = environment;
        self
    }

    /// Adds an arbitrary content member; it will be hashed into
    /// `file_hashes` like every other non-manifest member.
    pub fn extra_member(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.extra_members.push((name.into(), bytes));
        self
    }

    /// Writes the container to `path`, signing the manifest when a keypair
    /// is supplied.
    ///
    /// The archive is written to a temporary file in the destination
    /// directory and atomically renamed into place, so a failed write never
    /// leaves a partial container at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if serialization, signing, archive
    /// writing, or publishing fails. Write failures propagate; a failed
    /// write must not silently report success.
    pub fn write(
        self,
        path: impl AsRef<Path>,
        keypair: Option<&Keypair>,
    ) -> Result<Manifest, ContainerError> {
        let path = path.as_ref();

        let mut steps_bytes = Vec::new();
        for step in &self.steps {
            serde_json::to_writer(&mut steps_bytes, step)?;
            steps_bytes.push(b'\n');
        }
        let environment_bytes = serde_json::to_vec_pretty(&self.environment)?;

        // Every non-manifest member gets a hash entry, the mimetype marker
        // included.
        let mut members: Vec<(String, Vec<u8>)> = vec![
            (STEPS_MEMBER.to_string(), steps_bytes),
            (ENVIRONMENT_MEMBER.to_string(), environment_bytes),
        ];
        members.extend(self.extra_members);

        let mut manifest = Manifest::new(self.session_id, self.workflow_name);
        manifest.step_count = self.steps.len() as u64;
        manifest.tags = self.tags;
        manifest.goal = self.goal;
        manifest
            .file_hashes
            .insert(MIMETYPE_MEMBER.to_string(), sha256_hex(MEDIA_TYPE.as_bytes()));
        for (name, bytes) in &members {
            manifest.file_hashes.insert(name.clone(), sha256_hex(bytes));
        }

        if let Some(keypair) = keypair {
            sign_manifest(&mut manifest, keypair)?;
        }
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            std::fs::create_dir_all(dir)?;
        }
        let mut tmp = NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;

        {
            let mut archive = ZipWriter::new(tmp.as_file_mut());

            // The mimetype marker goes first and uncompressed so the media
            // type is sniffable at a fixed offset.
            let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            archive.start_file(MIMETYPE_MEMBER, stored)?;
            archive.write_all(MEDIA_TYPE.as_bytes())?;

            let deflated = SimpleFileOptions::default();
            archive.start_file(MANIFEST_MEMBER, deflated)?;
            archive.write_all(&manifest_bytes)?;

            for (name, bytes) in &members {
                archive.start_file(name.as_str(), deflated)?;
                archive.write_all(bytes)?;
            }

            archive.finish()?;
        }

        tmp.flush()?;
        tmp.persist(path)
            .map_err(|e| ContainerError::Publish(e.to_string()))?;

        Ok(manifest)
    }
}
