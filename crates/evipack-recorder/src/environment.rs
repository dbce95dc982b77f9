//! Environment snapshot capture.

use chrono::Utc;
use serde_json::{json, Value};

/// Captures a free-form snapshot of the producing environment.
///
/// Written into the container's `environment.json` member. The snapshot is
/// not hash-verified against anything beyond its own `file_hashes` entry,
/// so fields can evolve without breaking verification of old containers.
pub fn capture_environment() -> Value {
    json!({
        "platform": {
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "family": std::env::consts::FAMILY,
        },
        "recorder": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "captured_at": Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_names_platform_and_recorder() {
        let env = capture_environment();
        assert!(env["platform"]["os"].is_string());
        assert_eq!(env["recorder"]["name"], "evipack-recorder");
        assert!(env["captured_at"].is_string());
    }
}
