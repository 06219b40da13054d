use anyhow::{Context, Result};
use constraints_core::VerificationOptions;
use constraints_parser::parse_file;
use constraints_validator::verify;
use std::path::Path;
use tracing::info;

use crate::{Format, dataset, output};

pub fn execute(
    data_path: &str,
    constraints_path: &str,
    options: VerificationOptions,
    format: Format,
) -> Result<()> {
    info!("Verifying {} against {}", data_path, constraints_path);
    info!(
        "Epsilon: {}, type checking: {:?}",
        options.epsilon, options.type_checking
    );

    let loaded = parse_file(Path::new(constraints_path))
        .with_context(|| format!("Failed to parse constraint file: {}", constraints_path))?;
    for warning in &loaded.warnings {
        output::print_warning(warning);
    }

    let dataset = dataset::load(Path::new(data_path))?;

    let result = verify(&dataset, &loaded.constraints, options);

    match format {
        Format::Json => output::print_json_result(&result)?,
        Format::Text => output::print_text_result(&result),
    }

    if !result.passed() {
        std::process::exit(1);
    }

    Ok(())
}
