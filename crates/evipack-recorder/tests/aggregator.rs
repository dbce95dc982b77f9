use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;

use evipack_core::StepRecord;
use evipack_recorder::{AggregatorConfig, EvidenceAggregator, EvidenceGroup, FlushSink};

#[derive(Default)]
struct CapturingSink {
    groups: Mutex<Vec<EvidenceGroup>>,
}

impl CapturingSink {
    fn take(&self) -> Vec<EvidenceGroup> {
        std::mem::take(&mut *self.groups.lock().unwrap())
    }

    fn count(&self) -> usize {
        self.groups.lock().unwrap().len()
    }
}

impl FlushSink for CapturingSink {
    fn accept(&self, group: EvidenceGroup) {
        self.groups.lock().unwrap().push(group);
    }
}

fn fast_config() -> AggregatorConfig {
    AggregatorConfig {
        inactivity_window: Duration::from_millis(100),
        sweep_interval: Duration::from_millis(20),
    }
}

fn step_at(second: u32) -> StepRecord {
    StepRecord::at(
        "llm.request",
        json!({"t": second}),
        Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, second).unwrap(),
    )
}

#[test]
fn out_of_order_concurrent_ingest_flushes_once_sorted() {
    let sink = Arc::new(CapturingSink::default());
    let aggregator = EvidenceAggregator::new(fast_config(), sink.clone());

    // Three producers deliver t=2, t=1, t=3 for the same correlation id.
    let handles: Vec<_> = [2u32, 1, 3]
        .into_iter()
        .map(|second| {
            let aggregator = aggregator.clone();
            thread::spawn(move || aggregator.ingest("A", step_at(second)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Wait past the inactivity window for the sweep to fire.
    thread::sleep(Duration::from_millis(400));

    let groups = sink.take();
    assert_eq!(groups.len(), 1, "exactly one flush per burst of activity");
    let group = &groups[0];
    assert_eq!(group.correlation_id, "A");
    let seconds: Vec<i64> = group
        .events
        .iter()
        .map(|s| s.timestamp.timestamp() % 60)
        .collect();
    assert_eq!(seconds, vec![1, 2, 3]);

    aggregator.shutdown();
}

#[test]
fn close_flushes_immediately_and_restarts_the_group() {
    let sink = Arc::new(CapturingSink::default());
    let aggregator = EvidenceAggregator::new(fast_config(), sink.clone());

    aggregator.ingest("A", step_at(1));
    assert!(aggregator.close("A"));
    assert_eq!(sink.count(), 1);
    assert_eq!(aggregator.live_groups(), 0);

    // A later event for the same id starts a fresh group.
    aggregator.ingest("A", step_at(2));
    assert_eq!(aggregator.live_groups(), 1);
    assert!(aggregator.close("A"));

    let groups = sink.take();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].events.len(), 1);
    assert_eq!(groups[1].events.len(), 1);

    aggregator.shutdown();
}

#[test]
fn close_on_unknown_id_returns_false() {
    let sink = Arc::new(CapturingSink::default());
    let aggregator = EvidenceAggregator::new(fast_config(), sink.clone());

    assert!(!aggregator.close("never-seen"));
    assert_eq!(sink.count(), 0);

    aggregator.shutdown();
}

#[test]
fn concurrent_ingest_same_id_builds_one_group() {
    let sink = Arc::new(CapturingSink::default());
    // Long window so the sweep cannot race the producers.
    let aggregator = EvidenceAggregator::new(
        AggregatorConfig {
            inactivity_window: Duration::from_secs(60),
            sweep_interval: Duration::from_millis(20),
        },
        sink.clone(),
    );

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let aggregator = aggregator.clone();
            thread::spawn(move || {
                for i in 0..25u32 {
                    aggregator.ingest("shared", step_at((worker * 25 + i) % 60));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(aggregator.live_groups(), 1);
    assert!(aggregator.close("shared"));

    let groups = sink.take();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].events.len(), 100);

    aggregator.shutdown();
}

#[test]
fn flush_all_drains_every_live_group() {
    let sink = Arc::new(CapturingSink::default());
    let aggregator = EvidenceAggregator::new(
        AggregatorConfig {
            inactivity_window: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(60),
        },
        sink.clone(),
    );

    aggregator.ingest("A", step_at(1));
    aggregator.ingest("B", step_at(2));
    aggregator.flush_all();

    assert_eq!(aggregator.live_groups(), 0);
    assert_eq!(sink.count(), 2);

    aggregator.shutdown();
}

#[test]
fn shutdown_flushes_buffered_groups() {
    let sink = Arc::new(CapturingSink::default());
    let aggregator = EvidenceAggregator::new(
        AggregatorConfig {
            inactivity_window: Duration::from_secs(60),
            sweep_interval: Duration::from_millis(20),
        },
        sink.clone(),
    );

    aggregator.ingest("A", step_at(1));
    aggregator.shutdown();

    assert_eq!(sink.count(), 1);
    assert_eq!(aggregator.live_groups(), 0);
}

#[test]
fn different_ids_flush_independently() {
    let sink = Arc::new(CapturingSink::default());
    let aggregator = EvidenceAggregator::new(fast_config(), sink.clone());

    aggregator.ingest("A", step_at(1));
    aggregator.ingest("B", step_at(2));
    thread::sleep(Duration::from_millis(400));

    let groups = sink.take();
    assert_eq!(groups.len(), 2);
    let mut ids: Vec<&str> = groups.iter().map(|g| g.correlation_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["A", "B"]);

    aggregator.shutdown();
}
