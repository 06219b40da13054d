use anyhow::{Context, Result};
use chrono::Utc;
use constraints_core::CreationMetadata;
use constraints_parser::{to_json, write_file};
use constraints_validator::discover;
use std::path::Path;
use tracing::info;

use crate::{dataset, output};

pub fn execute(data_path: &str, output_path: Option<&str>) -> Result<()> {
    info!("Discovering constraints from: {}", data_path);

    let dataset = dataset::load(Path::new(data_path))?;

    let Some(mut constraints) = discover(&dataset).context("Discovery failed")? else {
        output::print_error(&format!("No constraints could be inferred from {data_path}"));
        std::process::exit(1);
    };

    constraints.set_creation_metadata(CreationMetadata {
        creator: format!("dcv {}", env!("CARGO_PKG_VERSION")),
        utc_time: Utc::now(),
        n_records: dataset.row_count(),
        n_fields: dataset.column_count(),
    });

    match output_path {
        Some(path) => {
            write_file(&constraints, Path::new(path))
                .with_context(|| format!("Failed to write constraints to: {}", path))?;
            output::print_success(&format!(
                "Wrote {} constraints on {} fields to {}",
                constraints.constraint_count(),
                constraints.len(),
                path
            ));
        }
        None => print!("{}", to_json(&constraints)?),
    }

    Ok(())
}
