//! Verify command implementation.

use evipack_container::{verify_path, VerificationPolicy};
use serde_json::json;

use crate::output;

pub fn run(
    path: String,
    public_key: Option<String>,
    fail_on_unsigned: bool,
    no_fail_on_tampered: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = verify_path(&path, public_key.as_deref());

    if summary.total == 0 {
        if json_output {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("No .epi containers found under {}", path);
        }
        return Ok(());
    }

    let policy = VerificationPolicy {
        fail_on_tampered: !no_fail_on_tampered,
        fail_on_unsigned,
    };
    let passed = summary.passes(&policy);

    if json_output {
        let mut value = serde_json::to_value(&summary)?;
        value["result"] = json!(if passed { "pass" } else { "fail" });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for report in &summary.reports {
            println!("{}", output::format_report_line(report));
        }
        println!();
        println!(
            "total: {}  verified: {}  tampered: {}  unsigned: {}",
            summary.total, summary.verified, summary.tampered, summary.unsigned
        );
        if passed {
            println!("PASS: {}/{} verified, {} unsigned", summary.verified, summary.total, summary.unsigned);
        } else {
            if policy.fail_on_tampered && summary.tampered > 0 {
                println!("FAIL: {} tampered container(s) found", summary.tampered);
            }
            if policy.fail_on_unsigned && summary.unsigned > 0 {
                println!("FAIL: {} unsigned container(s) found", summary.unsigned);
            }
        }
    }

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}
