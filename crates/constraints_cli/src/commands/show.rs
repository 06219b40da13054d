use anyhow::{Context, Result};
use constraints_core::FieldConstraints;
use constraints_parser::parse_file;
use std::path::Path;
use tracing::info;

use crate::output;

pub fn execute(constraints_path: &str) -> Result<()> {
    info!("Reading constraint file: {}", constraints_path);

    let loaded = parse_file(Path::new(constraints_path))
        .with_context(|| format!("Failed to parse constraint file: {}", constraints_path))?;
    for warning in &loaded.warnings {
        output::print_warning(warning);
    }
    let constraints = &loaded.constraints;

    output::print_info(&format!(
        "{} constraints on {} fields",
        constraints.constraint_count(),
        constraints.len()
    ));

    if let Some(metadata) = constraints.creation_metadata() {
        println!("\nCreated:");
        println!("  By:      {}", metadata.creator);
        println!("  At:      {}", metadata.utc_time.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  Records: {}", metadata.n_records);
        println!("  Fields:  {}", metadata.n_fields);
    }

    println!("\nFields:");
    let width = constraints.field_names().map(str::len).max().unwrap_or(0);
    for field in constraints.fields() {
        println!("  {:<width$}  {}", field.name(), describe(field)?);
    }

    let groups: Vec<_> = constraints.field_groups().collect();
    if !groups.is_empty() {
        println!("\nField groups:");
        for group in groups {
            let kinds: Vec<String> = group.iter().map(|c| c.kind().to_string()).collect();
            println!("  {}  {}", group.key(), kinds.join(", "));
        }
    }

    Ok(())
}

/// One-line `kind=value` listing of a field's constraints.
fn describe(field: &FieldConstraints) -> Result<String> {
    let parts = field
        .iter()
        .map(|c| Ok(format!("{}={}", c.kind(), serde_json::to_string(c)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(", "))
}
