use anyhow::Result;
use colored::*;
use constraints_core::ReportFilter;
use constraints_validator::VerificationResult;
use serde_json::json;

pub fn print_text_result(result: &VerificationResult) {
    println!("{}", "═".repeat(60));
    println!("{}", "  VERIFICATION REPORT".bold());
    println!("{}", "═".repeat(60));
    println!();

    print!("{}", result);

    if !result.diagnostics.is_empty() {
        println!("\n{}", "Diagnostics:".yellow().bold());
        for (i, diagnostic) in result.diagnostics.iter().enumerate() {
            println!("  {}. {}", i + 1, diagnostic.to_string().yellow());
        }
    }

    if result.passed() {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Verification PASSED".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Verification FAILED".red().bold()
        );
    }
    println!("{}", "═".repeat(60));
}

pub fn print_json_result(result: &VerificationResult) -> Result<()> {
    let fields: serde_json::Map<String, serde_json::Value> = result
        .fields
        .iter()
        .filter(|(_, f)| result.filter == ReportFilter::All || !f.passed())
        .map(|(name, f)| Ok((name.clone(), serde_json::to_value(f)?)))
        .collect::<Result<_>>()?;

    let output = json!({
        "passed": result.passed(),
        "passes": result.passes,
        "failures": result.failures,
        "fields": fields,
        "diagnostics": result.diagnostics,
        "table": result.to_table(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
