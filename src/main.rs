//! Metacurate CLI - bulk-edit repository metadata from CSV files
//!
//! # Main Commands
//!
//! ```bash
//! metacurate apply changes.csv            # Validate, merge and write
//! metacurate apply changes.csv --dry-run  # Everything except the write
//! metacurate preview changes.csv          # Show parsed change records
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! metacurate validate changes.csv   # Validation only, no network
//! metacurate fields                 # Show the column mapping table
//! ```

use clap::{Parser, Subcommand};
use metacurate::{
    ingest_file, run_batch, validate_change, BatchOptions, HttpResourceClient, VocabularyAdvisor,
    FIELD_REGISTRY,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "metacurate")]
#[command(about = "Bulk-edit repository metadata from CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch: validate, merge and write each change record
    Apply {
        /// Input CSV file
        input: PathBuf,

        /// Validate and merge, but perform no remote write
        #[arg(long)]
        dry_run: bool,

        /// Records per sequential chunk
        #[arg(long, default_value = "10")]
        chunk_size: usize,

        /// Pause between chunks, in milliseconds
        #[arg(long, default_value = "500")]
        chunk_delay_ms: u64,

        /// Default language for untagged multilingual segments
        #[arg(long, default_value = "en")]
        default_language: String,

        /// Write the batch result as JSON (default: stdout summary only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV and show the change records it would produce
    Preview {
        /// Input CSV file
        input: PathBuf,
    },

    /// Validate a CSV without touching the network
    Validate {
        /// Input CSV file
        input: PathBuf,
    },

    /// Show the CSV column mapping table
    Fields,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            input,
            dry_run,
            chunk_size,
            chunk_delay_ms,
            default_language,
            output,
        } => {
            cmd_apply(
                &input,
                BatchOptions {
                    dry_run,
                    chunk_size,
                    chunk_delay_ms,
                    default_language,
                },
                output.as_deref(),
            )
            .await
        }

        Commands::Preview { input } => cmd_preview(&input),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Fields => cmd_fields(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_apply(
    input: &Path,
    options: BatchOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {}", input.display());

    let client = HttpResourceClient::from_env()?;
    let ingest = ingest_file(input)?;

    eprintln!("   Encoding: {}", ingest.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(ingest.delimiter));
    eprintln!("   Mode: {:?}", ingest.mode);
    eprintln!("   Records: {} ({} skipped)", ingest.records.len(), ingest.skipped.len());

    let result = run_batch(&client, ingest, &options).await?;

    eprintln!("\n{}", result.summary());
    for failure in result.failures.iter().take(5) {
        eprintln!("   row {}: {}", failure.row, failure.error);
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        fs::write(path, &json)?;
        eprintln!("Result written to: {}", path.display());
    }

    if !result.failures.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_preview(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing: {}", input.display());

    let ingest = ingest_file(input)?;

    eprintln!("   Encoding: {}", ingest.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(ingest.delimiter));
    eprintln!("   Mode: {:?}", ingest.mode);
    if !ingest.unsupported_columns.is_empty() {
        eprintln!("   Unsupported columns: {}", ingest.unsupported_columns.join(", "));
    }

    let json = serde_json::to_string_pretty(&ingest.records)?;
    println!("{}", json);

    if !ingest.skipped.is_empty() {
        eprintln!("\nSkipped rows:");
        for skip in &ingest.skipped {
            eprintln!("   row {}: {}", skip.row, skip.reason);
        }
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Validating: {}", input.display());

    let ingest = ingest_file(input)?;
    let advisor = VocabularyAdvisor::default();

    let mut invalid = 0;
    for record in &ingest.records {
        let report = validate_change(record, &advisor);
        if !report.is_valid() {
            invalid += 1;
            eprintln!("\nRow {} invalid:", record.source_row);
            for err in &report.errors {
                eprintln!("   - {}", err);
            }
        }
        for warning in &report.warnings {
            eprintln!("Row {} warning: {}", record.source_row, warning);
        }
        for suggestion in &report.suggestions {
            eprintln!("Row {} suggestion: {}", record.source_row, suggestion);
        }
    }

    eprintln!(
        "\nResults: {} valid, {} invalid, {} skipped",
        ingest.records.len() - invalid,
        invalid,
        ingest.skipped.len()
    );

    if invalid > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_fields() -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{:<18} {:<14} {:<16} {}",
        "column", "field", "format", "property"
    );
    for mapping in FIELD_REGISTRY.mappings() {
        println!(
            "{:<18} {:<14} {:<16} {}",
            mapping.csv_column,
            mapping.semantic_field,
            format!("{:?}", mapping.value_format).to_lowercase(),
            mapping.property_id
        );
    }
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
