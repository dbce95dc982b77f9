//! Step record data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single recorded step: the atomic unit of evidence.
///
/// The payload is deliberately opaque: `content` is any JSON object and
/// `kind` is a dotted tag such as `llm.response` or `tool.end`. Records are
/// immutable once created and serialized one-per-line into the container's
/// `steps.jsonl` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step kind tag (e.g., `llm.request`, `tool.end`, `session.start`).
    pub kind: String,
    /// Opaque JSON payload for this step.
    pub content: Value,
    /// When the step occurred (UTC, serialized as ISO-8601).
    pub timestamp: DateTime<Utc>,
}

impl StepRecord {
    /// Creates a step record stamped with the current time.
    pub fn new(kind: impl Into<String>, content: Value) -> Self {
        Self {
            kind: kind.into(),
            content,
            timestamp: Utc::now(),
        }
    }

    /// Creates a step record with an explicit timestamp.
    ///
    /// Used by adapters replaying events that carry their own clocks; the
    /// aggregator sorts by this timestamp at flush time.
    pub fn at(kind: impl Into<String>, content: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            content,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn serializes_timestamp_as_iso8601() {
        let ts = Utc.with_ymd_and_hms(2026, 8, 28, 12, 0, 0).unwrap();
        let step = StepRecord::at("llm.request", json!({"model": "m-1"}), ts);
        let line = serde_json::to_string(&step).unwrap();
        assert!(line.contains("2026-08-28T12:00:00Z"));

        let back: StepRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn accepts_fractional_second_timestamps() {
        let line = r#"{"kind":"tool.end","content":{},"timestamp":"2026-08-28T12:00:00.123456+00:00"}"#;
        let step: StepRecord = serde_json::from_str(line).unwrap();
        assert_eq!(step.kind, "tool.end");
    }
}
