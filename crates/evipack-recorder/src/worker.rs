//! Background persistence and signing worker.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{error, info, warn};

use evipack_container::ContainerBuilder;
use evipack_core::{Keypair, SessionId, WorkflowName};

use crate::aggregator::{EvidenceGroup, FlushSink};
use crate::environment::capture_environment;
use crate::errors::RecorderError;

/// Configuration for the persistence worker.
#[derive(Clone)]
pub struct WorkerConfig {
    /// Directory containers are written into.
    pub storage_dir: PathBuf,
    /// Workflow label stamped into each manifest.
    pub workflow_name: WorkflowName,
    /// Signing keypair; absent means containers are written unsigned. This
    /// is decided here, at configuration time, never deep in the write path.
    pub keypair: Option<Keypair>,
    /// How long the consumer blocks per dequeue before re-checking its stop
    /// signal.
    pub recv_timeout: Duration,
    /// Upper bound [`PersistenceWorker::stop`] waits for the queue to drain.
    pub stop_timeout: Duration,
}

impl WorkerConfig {
    /// Creates a config with default timeouts and no signing key.
    pub fn new(storage_dir: impl Into<PathBuf>, workflow_name: WorkflowName) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            workflow_name,
            keypair: None,
            recv_timeout: Duration::from_millis(200),
            stop_timeout: Duration::from_secs(5),
        }
    }

    /// Configures a signing keypair.
    pub fn with_keypair(mut self, keypair: Keypair) -> Self {
        self.keypair = Some(keypair);
        self
    }
}

/// Single-consumer background worker that turns flushed evidence groups
/// into durable signed containers.
///
/// The queue is unbounded by design: producers are never blocked by
/// persistence speed, trading memory for latency. Callers needing bounded
/// memory must impose an external cap via [`queue_size`](Self::queue_size).
/// Items are processed strictly in enqueue order; a failure on one item is
/// logged and the loop continues with the next.
pub struct PersistenceWorker {
    tx: Sender<EvidenceGroup>,
    rx: Receiver<EvidenceGroup>,
    config: Arc<WorkerConfig>,
    running: AtomicBool,
    draining: Arc<AtomicBool>,
    hard_stop: Arc<AtomicBool>,
    processed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceWorker {
    /// Creates a worker; call [`start`](Self::start) to begin consuming.
    pub fn new(config: WorkerConfig) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            config: Arc::new(config),
            running: AtomicBool::new(false),
            draining: Arc::new(AtomicBool::new(false)),
            hard_stop: Arc::new(AtomicBool::new(false)),
            processed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            handle: Mutex::new(None),
        }
    }

    /// Starts the consumption loop. Idempotent: a second call while running
    /// is a no-op.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.draining.store(false, Ordering::SeqCst);
        self.hard_stop.store(false, Ordering::SeqCst);

        let rx = self.rx.clone();
        let config = Arc::clone(&self.config);
        let draining = Arc::clone(&self.draining);
        let hard_stop = Arc::clone(&self.hard_stop);
        let processed = Arc::clone(&self.processed);
        let failed = Arc::clone(&self.failed);

        let handle = std::thread::Builder::new()
            .name("evipack-signer".to_string())
            .spawn(move || {
                Self::run_loop(rx, config, draining, hard_stop, processed, failed)
            })
            .expect("failed to spawn persistence worker thread");
        *self.handle.lock().expect("worker handle lock poisoned") = Some(handle);
        info!("persistence worker started");
    }

    /// Non-blocking hand-off of a completed evidence group.
    pub fn enqueue(&self, group: EvidenceGroup) {
        // The receiver lives as long as self, so send cannot fail while the
        // worker exists.
        let _ = self.tx.send(group);
    }

    /// Current backlog depth, for backpressure monitoring.
    pub fn queue_size(&self) -> usize {
        self.tx.len()
    }

    /// Number of items persisted successfully.
    pub fn processed_count(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    /// Number of items that failed processing.
    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Signals the loop to stop after draining and waits up to
    /// `stop_timeout` for it to exit.
    ///
    /// An item already accepted off the queue is allowed to finish. If the
    /// deadline elapses first, remaining queued items are dropped and the
    /// loss is surfaced as a warning, never silently.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.draining.store(true, Ordering::SeqCst);

        let handle = self
            .handle
            .lock()
            .expect("worker handle lock poisoned")
            .take();
        let handle = match handle {
            Some(h) => h,
            None => return,
        };

        let deadline = Instant::now() + self.config.stop_timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                self.hard_stop.store(true, Ordering::SeqCst);
                let dropped = self.tx.len();
                if dropped > 0 {
                    warn!(dropped, "shutdown deadline elapsed; dropping queued evidence items");
                }
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let _ = handle.join();
        info!("persistence worker stopped");
    }

    fn run_loop(
        rx: Receiver<EvidenceGroup>,
        config: Arc<WorkerConfig>,
        draining: Arc<AtomicBool>,
        hard_stop: Arc<AtomicBool>,
        processed: Arc<AtomicUsize>,
        failed: Arc<AtomicUsize>,
    ) {
        loop {
            if hard_stop.load(Ordering::SeqCst) {
                break;
            }
            match rx.recv_timeout(config.recv_timeout) {
                Ok(group) => {
                    let correlation_id = group.correlation_id.clone();
                    match Self::process_item(&config, group) {
                        Ok(path) => {
                            processed.fetch_add(1, Ordering::SeqCst);
                            info!(correlation_id = %correlation_id, path = %path.display(), "persisted evidence container");
                        }
                        Err(e) => {
                            // One bad item must never halt the loop.
                            failed.fetch_add(1, Ordering::SeqCst);
                            error!(correlation_id = %correlation_id, error = %e, "failed to persist evidence item");
                        }
                    }
                    if draining.load(Ordering::SeqCst) && rx.is_empty() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if draining.load(Ordering::SeqCst) && rx.is_empty() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn process_item(
        config: &WorkerConfig,
        group: EvidenceGroup,
    ) -> Result<PathBuf, RecorderError> {
        // Correlation ids can arrive straight from telemetry; an id unfit
        // for a manifest field fails the item here rather than producing a
        // container under a mangled name.
        let session_id = SessionId::parse(group.correlation_id.as_str())?;
        let filename = format!(
            "{}_{}_{}.epi",
            sanitize(config.workflow_name.as_str()),
            sanitize(session_id.as_str()),
            Utc::now().format("%Y%m%d_%H%M%S_%f"),
        );
        let path = config.storage_dir.join(filename);

        ContainerBuilder::new(session_id, config.workflow_name.clone())
            .steps(group.events)
            .environment(capture_environment())
            .write(&path, config.keypair.as_ref())?;

        Ok(path)
    }
}

impl FlushSink for PersistenceWorker {
    fn accept(&self, group: EvidenceGroup) {
        self.enqueue(group);
    }
}

/// Restricts filename components to a conservative character set.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize("a/b c:d"), "a-b-c-d");
        assert_eq!(sanitize("trace_1.run-2"), "trace_1.run-2");
    }
}
