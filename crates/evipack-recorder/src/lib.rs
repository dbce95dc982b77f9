//! Event aggregation, background persistence, and session handles.
//!
//! This crate is the producer-facing half of the evidence pipeline:
//!
//! - [`EvidenceAggregator`] buffers step records per correlation id and
//!   flushes a group on inactivity or explicit close.
//! - [`PersistenceWorker`] drains flushed groups off an unbounded queue on
//!   a single background thread and drives signing + container writing, so
//!   producers never block on crypto or disk I/O.
//! - [`Recorder`] / [`RecorderSession`] tie the two together behind an
//!   explicit session handle.
//!
//! Concurrency model: any number of producer threads call into the
//! aggregator; one sweep thread drives inactivity flushing; one consumer
//! thread drains the worker queue. The live-group map is the only shared
//! mutable resource and sits behind a single mutex.
//!
#![deny(missing_docs)]

/// Evidence grouping and flush policy.
pub mod aggregator;
/// Environment snapshot capture.
pub mod environment;
/// Error types for recorder operations.
pub mod errors;
/// Recorder assembly and session handles.
pub mod session;
/// Background persistence and signing worker.
pub mod worker;

pub use aggregator::{AggregatorConfig, EvidenceAggregator, EvidenceGroup, FlushSink};
pub use environment::capture_environment;
pub use errors::RecorderError;
pub use session::{
    clear_current_session, current_session, set_current_session, Recorder, RecorderSession,
};
pub use worker::{PersistenceWorker, WorkerConfig};
