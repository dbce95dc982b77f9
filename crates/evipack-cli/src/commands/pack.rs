//! Pack command implementation.

use std::fs;

use evipack_container::ContainerBuilder;
use evipack_core::{Keypair, SessionId, StepRecord, WorkflowName};

pub fn run(
    steps_path: String,
    out: String,
    session: String,
    workflow: String,
    sign_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&steps_path)
        .map_err(|e| format!("Failed to read step log: {}", e))?;

    let mut steps: Vec<StepRecord> = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let step = serde_json::from_str(line)
            .map_err(|e| format!("Invalid step record on line {}: {}", number + 1, e))?;
        steps.push(step);
    }

    let keypair = match sign_key {
        Some(hex) => Some(Keypair::from_hex(&hex)?),
        None => None,
    };

    let session = SessionId::parse(session)?;
    let workflow = WorkflowName::parse(workflow)?;
    let manifest = ContainerBuilder::new(session, workflow)
        .steps(steps)
        .write(&out, keypair.as_ref())?;

    println!(
        "Wrote {} ({} steps, {})",
        out,
        manifest.step_count,
        if manifest.signature.is_some() { "signed" } else { "unsigned" }
    );

    Ok(())
}
