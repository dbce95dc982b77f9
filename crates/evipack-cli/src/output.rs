//! Output formatting utilities.

use evipack_container::VerificationReport;
use evipack_core::StepRecord;
use serde_json::Value;

/// Formats a value as pretty JSON.
pub fn format_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats a per-container verification line.
pub fn format_report_line(report: &VerificationReport) -> String {
    let name = report
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| report.path.display().to_string());

    let status = if report.tampered {
        format!(
            "TAMPERED ({})",
            report.error.as_deref().unwrap_or("unknown")
        )
    } else if !report.signed {
        "UNSIGNED (valid archive)".to_string()
    } else if report.signature_valid == Some(true) {
        "VERIFIED".to_string()
    } else {
        format!(
            "INDETERMINATE ({})",
            report.error.as_deref().unwrap_or("cannot verify signature")
        )
    };

    format!("{:<40} {}", truncate(&name, 40), status)
}

/// Formats a step record as a simple table row.
pub fn format_step_row(index: usize, step: &StepRecord) -> String {
    format!(
        "{:<6} {:<24} {}",
        index,
        truncate(&step.kind, 24),
        step.timestamp.to_rfc3339()
    )
}

/// Prints the step table header.
pub fn print_step_header() {
    println!("{:<6} {:<24} {}", "INDEX", "KIND", "TIMESTAMP");
    println!("{}", "-".repeat(70));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    // Back the cut off to a char boundary so multi-byte input cannot panic.
    let mut end = max_len.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_shortens_long_values() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Each arrow is 3 bytes; a byte-indexed cut would land mid-char.
        let kind = "→→→→→→→→→→";
        let out = truncate(kind, 8);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 8);
    }
}
