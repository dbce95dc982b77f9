//! List command implementation.

use evipack_container::ContainerReader;

use crate::output;

pub fn run(
    container: String,
    json_output: bool,
    max_steps: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = ContainerReader::open(&container)
        .map_err(|e| format!("Failed to open container: {}", e))?;
    let steps = reader.steps()?;
    let limit = max_steps.unwrap_or(steps.len());

    if json_output {
        for step in steps.iter().take(limit) {
            println!("{}", serde_json::to_string(step)?);
        }
        return Ok(());
    }

    output::print_step_header();
    for (index, step) in steps.iter().take(limit).enumerate() {
        println!("{}", output::format_step_row(index, step));
    }

    Ok(())
}
