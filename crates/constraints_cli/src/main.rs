mod commands;
mod dataset;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use constraints_core::{DEFAULT_EPSILON, ReportFilter, TypeChecking, VerificationOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dcv")]
#[command(version, about = "Data constraints discovery and verification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover constraints from a reference dataset
    Discover {
        /// Path to the dataset (columnar JSON)
        data: String,

        /// Output file path (.tdda, .json, .yml or .yaml; defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify a dataset against a constraint file
    Verify {
        /// Path to the dataset (columnar JSON)
        data: String,

        /// Path to the constraint file
        constraints: String,

        /// Relative tolerance for fuzzy bounds
        #[arg(short, long, default_value_t = DEFAULT_EPSILON)]
        epsilon: f64,

        /// Reject storage-induced type promotions
        #[arg(long)]
        strict_types: bool,

        /// Only report fields with failing constraints
        #[arg(long)]
        failing_only: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print a summary of a constraint file
    Show {
        /// Path to the constraint file
        constraints: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout carries reports and constraint files, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Discover { data, output } => commands::discover::execute(&data, output.as_deref()),

        Commands::Verify {
            data,
            constraints,
            epsilon,
            strict_types,
            failing_only,
            format,
        } => {
            let options = VerificationOptions::new()
                .with_epsilon(epsilon)
                .with_type_checking(if strict_types {
                    TypeChecking::Strict
                } else {
                    TypeChecking::Sloppy
                })
                .with_report(if failing_only {
                    ReportFilter::Failing
                } else {
                    ReportFilter::All
                });
            commands::verify::execute(&data, &constraints, options, format)
        }

        Commands::Show { constraints } => commands::show::execute(&constraints),
    }
}
