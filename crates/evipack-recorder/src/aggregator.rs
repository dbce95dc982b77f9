//! Evidence grouping and flush policy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use evipack_core::StepRecord;

/// A buffered group of step records sharing one correlation id.
///
/// Created on the first event for a new correlation id, mutated only by the
/// aggregator (append-only), and removed from the live buffer exactly once
/// when flushed. At most one live, unflushed group exists per correlation id.
#[derive(Debug)]
pub struct EvidenceGroup {
    /// Correlation id shared by every event in this group.
    pub correlation_id: String,
    /// Buffered step records, sorted by timestamp at flush time.
    pub events: Vec<StepRecord>,
    /// When the first event arrived.
    pub first_seen: Instant,
    /// When the most recent event arrived.
    pub last_seen: Instant,
}

/// Consumer of flushed evidence groups.
///
/// Implementations must not block the calling thread for long; the
/// persistence worker satisfies this by enqueueing onto an unbounded queue.
pub trait FlushSink: Send + Sync + 'static {
    /// Accepts one flushed group.
    fn accept(&self, group: EvidenceGroup);
}

/// Configuration for the aggregator's flush policy.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    /// A group flushes once no event has arrived for this long.
    pub inactivity_window: Duration,
    /// How often the background sweep checks for inactive groups.
    pub sweep_interval: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            inactivity_window: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(15),
        }
    }
}

struct Inner {
    live: Mutex<HashMap<String, EvidenceGroup>>,
    sink: Arc<dyn FlushSink>,
    config: AggregatorConfig,
    shutdown: AtomicBool,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

/// Buffers inbound step records by correlation id and decides when a group
/// is ready to flush.
///
/// Cloning produces another handle to the same buffer, so producer threads
/// and session handles can share one aggregator. Flushing happens on
/// inactivity (periodic sweep), explicit [`close`](Self::close), or
/// [`flush_all`](Self::flush_all) at shutdown.
#[derive(Clone)]
pub struct EvidenceAggregator {
    inner: Arc<Inner>,
}

impl EvidenceAggregator {
    /// Creates an aggregator flushing into `sink` and starts the sweep thread.
    pub fn new(config: AggregatorConfig, sink: Arc<dyn FlushSink>) -> Self {
        let inner = Arc::new(Inner {
            live: Mutex::new(HashMap::new()),
            sink,
            config,
            shutdown: AtomicBool::new(false),
            sweeper: Mutex::new(None),
        });

        let sweep_inner = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("evipack-sweep".to_string())
            .spawn(move || Self::sweep_loop(sweep_inner))
            .expect("failed to spawn sweep thread");
        *inner.sweeper.lock().expect("sweeper lock poisoned") = Some(handle);

        Self { inner }
    }

    /// Appends `step` to the group for `correlation_id`, creating the group
    /// on first contact. Safe to call concurrently, including for the same
    /// correlation id.
    ///
    /// Ingest never fails for well-formed records and never blocks beyond
    /// the bounded critical section around the live map.
    pub fn ingest(&self, correlation_id: &str, step: StepRecord) {
        let now = Instant::now();
        let mut live = self.inner.live.lock().expect("live map lock poisoned");
        let group = live
            .entry(correlation_id.to_string())
            .or_insert_with(|| EvidenceGroup {
                correlation_id: correlation_id.to_string(),
                events: Vec::new(),
                first_seen: now,
                last_seen: now,
            });
        group.events.push(step);
        group.last_seen = now;
    }

    /// Explicitly flushes the group for `correlation_id`.
    ///
    /// Returns `true` if a live group existed. A subsequent event for the
    /// same correlation id starts a new group.
    pub fn close(&self, correlation_id: &str) -> bool {
        let group = {
            let mut live = self.inner.live.lock().expect("live map lock poisoned");
            live.remove(correlation_id)
        };
        match group {
            Some(group) => {
                self.flush_group(group);
                true
            }
            None => false,
        }
    }

    /// Flushes every live group regardless of inactivity. Used at shutdown
    /// so buffered events are never lost.
    pub fn flush_all(&self) {
        let groups: Vec<EvidenceGroup> = {
            let mut live = self.inner.live.lock().expect("live map lock poisoned");
            live.drain().map(|(_, group)| group).collect()
        };
        for group in groups {
            self.flush_group(group);
        }
    }

    /// Number of live, unflushed groups.
    pub fn live_groups(&self) -> usize {
        self.inner.live.lock().expect("live map lock poisoned").len()
    }

    /// Stops the sweep thread and flushes every remaining group.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.swap(true, Ordering::SeqCst) {
            let handle = self
                .inner
                .sweeper
                .lock()
                .expect("sweeper lock poisoned")
                .take();
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
        self.flush_all();
    }

    /// Sorts the group's events by timestamp and hands it to the sink.
    ///
    /// Sorting happens here, not at ingest, because ingest order across
    /// concurrent producers is not guaranteed to match timestamp order. The
    /// sort is stable, so equal timestamps keep arrival order.
    fn flush_group(&self, mut group: EvidenceGroup) {
        group.events.sort_by_key(|step| step.timestamp);
        debug!(
            correlation_id = %group.correlation_id,
            events = group.events.len(),
            "flushing evidence group"
        );
        self.inner.sink.accept(group);
    }

    fn sweep_loop(inner: Arc<Inner>) {
        // Sleep in short ticks so shutdown is observed promptly even with a
        // long sweep interval.
        let tick = Duration::from_millis(20).min(inner.config.sweep_interval);
        let mut since_sweep = Duration::ZERO;
        while !inner.shutdown.load(Ordering::SeqCst) {
            std::thread::sleep(tick);
            since_sweep += tick;
            if since_sweep < inner.config.sweep_interval {
                continue;
            }
            since_sweep = Duration::ZERO;

            // Removal happens under the same lock as ingest, so a group is
            // flushed exactly once per burst of activity.
            let now = Instant::now();
            let expired: Vec<EvidenceGroup> = {
                let mut live = inner.live.lock().expect("live map lock poisoned");
                let stale_ids: Vec<String> = live
                    .iter()
                    .filter(|(_, group)| {
                        now.duration_since(group.last_seen) >= inner.config.inactivity_window
                    })
                    .map(|(id, _)| id.clone())
                    .collect();
                stale_ids
                    .into_iter()
                    .filter_map(|id| live.remove(&id))
                    .collect()
            };

            for mut group in expired {
                group.events.sort_by_key(|step| step.timestamp);
                debug!(
                    correlation_id = %group.correlation_id,
                    events = group.events.len(),
                    "inactivity flush"
                );
                inner.sink.accept(group);
            }
        }
    }
}
