//! Inspect command implementation.

use evipack_container::ContainerReader;
use serde_json::json;

use crate::output;

pub fn run(container: String, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = ContainerReader::open(&container)
        .map_err(|e| format!("Failed to open container: {}", e))?;

    let members = reader.member_names();
    let manifest = reader.manifest()?;

    if json_output {
        let value = json!({
            "path": container,
            "members": members,
            "manifest": manifest,
        });
        println!("{}", output::format_json(&value));
        return Ok(());
    }

    println!("Container: {}", container);
    println!("Members:");
    for name in &members {
        println!("  {}", name);
    }
    println!();
    println!("Session:    {}", manifest.session_id);
    println!("Workflow:   {}", manifest.workflow_name);
    println!("Created:    {}", manifest.created_at.to_rfc3339());
    println!("Steps:      {}", manifest.step_count);
    if !manifest.tags.is_empty() {
        println!("Tags:       {}", manifest.tags.join(", "));
    }
    if let Some(goal) = &manifest.goal {
        println!("Goal:       {}", goal);
    }
    println!(
        "Signed:     {}",
        if manifest.signature.is_some() { "yes" } else { "no" }
    );
    println!("Hashed members: {}", manifest.file_hashes.len());

    Ok(())
}
