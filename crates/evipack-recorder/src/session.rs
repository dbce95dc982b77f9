//! Recorder assembly and session handles.
//!
//! Sessions are explicit handles threaded through callers rather than
//! ambient state. Where ambient convenience is genuinely needed (adapters
//! that cannot thread a handle), one process-wide optional slot is provided
//! with a documented set/clear lifecycle; there is no implicit cross-thread
//! sharing beyond the mutex guarding that slot.

use std::sync::{Arc, Mutex, OnceLock};

use serde_json::{json, Value};

use evipack_core::{SessionId, StepRecord};

use crate::aggregator::{AggregatorConfig, EvidenceAggregator};
use crate::errors::RecorderError;
use crate::worker::{PersistenceWorker, WorkerConfig};

/// Assembled recording pipeline: aggregator + started persistence worker.
///
/// # Example
///
/// ```rust,no_run
/// use evipack_core::WorkflowName;
/// use evipack_recorder::{AggregatorConfig, Recorder, WorkerConfig};
/// use serde_json::json;
///
/// let recorder = Recorder::new(
///     AggregatorConfig::default(),
///     WorkerConfig::new("./evidence", WorkflowName::parse("demo-workflow")?),
/// );
/// let session = recorder.session("trace-1")?;
/// session.log_step("llm.request", json!({"model": "m-1"}));
/// session.close();
/// recorder.shutdown();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Recorder {
    aggregator: EvidenceAggregator,
    worker: Arc<PersistenceWorker>,
}

impl Recorder {
    /// Builds the pipeline and starts the worker and sweep threads.
    pub fn new(aggregator_config: AggregatorConfig, worker_config: WorkerConfig) -> Self {
        let worker = Arc::new(PersistenceWorker::new(worker_config));
        worker.start();
        let aggregator = EvidenceAggregator::new(aggregator_config, worker.clone());
        Self { aggregator, worker }
    }

    /// Opens a session for `correlation_id` and logs the conventional
    /// `session.start` marker step.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError::CorrelationId`] when the id does not fit
    /// the manifest/filename character set, so the problem surfaces here
    /// instead of during background persistence.
    pub fn session(&self, correlation_id: impl Into<String>) -> Result<RecorderSession, RecorderError> {
        let session = RecorderSession {
            correlation_id: SessionId::parse(correlation_id)?,
            aggregator: self.aggregator.clone(),
        };
        session.log_step("session.start", json!({}));
        Ok(session)
    }

    /// The underlying aggregator.
    pub fn aggregator(&self) -> &EvidenceAggregator {
        &self.aggregator
    }

    /// The underlying persistence worker.
    pub fn worker(&self) -> &PersistenceWorker {
        &self.worker
    }

    /// Flushes every buffered group and stops both background threads.
    ///
    /// Call at process shutdown to avoid losing buffered events; the worker
    /// is given its bounded stop timeout to drain.
    pub fn shutdown(&self) {
        self.aggregator.shutdown();
        self.worker.stop();
    }
}

/// Handle to an active recording session.
///
/// Cheap to clone; all clones feed the same buffered group until the
/// session closes.
#[derive(Clone)]
pub struct RecorderSession {
    correlation_id: SessionId,
    aggregator: EvidenceAggregator,
}

impl RecorderSession {
    /// The correlation id this session records under.
    pub fn correlation_id(&self) -> &str {
        self.correlation_id.as_str()
    }

    /// Records one step with the current timestamp.
    pub fn log_step(&self, kind: impl Into<String>, content: Value) {
        self.aggregator
            .ingest(self.correlation_id.as_str(), StepRecord::new(kind, content));
    }

    /// Records a pre-built step (e.g., one replayed with its own timestamp).
    pub fn log(&self, step: StepRecord) {
        self.aggregator.ingest(self.correlation_id.as_str(), step);
    }

    /// Logs the conventional `session.end` marker and flushes the group.
    pub fn close(&self) {
        self.log_step("session.end", json!({}));
        self.aggregator.close(self.correlation_id.as_str());
    }
}

fn current_slot() -> &'static Mutex<Option<RecorderSession>> {
    static CURRENT: OnceLock<Mutex<Option<RecorderSession>>> = OnceLock::new();
    CURRENT.get_or_init(|| Mutex::new(None))
}

/// Installs `session` as the process-wide current session, returning the
/// previously installed one, if any.
pub fn set_current_session(session: RecorderSession) -> Option<RecorderSession> {
    current_slot()
        .lock()
        .expect("current session lock poisoned")
        .replace(session)
}

/// Clears and returns the process-wide current session.
pub fn clear_current_session() -> Option<RecorderSession> {
    current_slot()
        .lock()
        .expect("current session lock poisoned")
        .take()
}

/// Returns a handle to the process-wide current session, if one is set.
pub fn current_session() -> Option<RecorderSession> {
    current_slot()
        .lock()
        .expect("current session lock poisoned")
        .clone()
}
