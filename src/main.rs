//! candidate-extract CLI: batch extraction and evaluation over JSONL files.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use candidate_extract::config::{self, ExtractorConfig};
use candidate_extract::pipeline::batch_extraction::{
    load_documents, save_records, BatchConfig, BatchRunner,
};
use candidate_extract::pipeline::evaluation::{
    evaluate, load_extracted_records, load_reference_records, render_table,
};

#[derive(Parser)]
#[command(name = "candidate-extract", version, about = "Candidate profile extraction")]
struct Cli {
    /// Configuration file (defaults to $CANDIDATE_EXTRACT_CONFIG, then ~/CandidateExtract/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured records from a JSONL document file.
    Extract {
        /// JSONL file with one document per line.
        #[arg(long)]
        input: PathBuf,

        /// JSONL file to write records to.
        #[arg(long)]
        output: PathBuf,

        /// Worker threads (defaults to available parallelism).
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Score extracted records against a reference set.
    Evaluate {
        /// JSONL records written by `extract`.
        #[arg(long)]
        records: PathBuf,

        /// Reference records (JSON array or JSONL).
        #[arg(long)]
        reference: PathBuf,

        /// Print the report as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    candidate_extract::init_tracing();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let cli = Cli::parse();
    let extractor_config =
        ExtractorConfig::resolve(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Extract {
            input,
            output,
            workers,
        } => {
            let pipeline = extractor_config.build_pipeline()?;
            let documents = load_documents(&input)
                .with_context(|| format!("reading documents from {}", input.display()))?;

            let batch_config = match workers {
                Some(workers) => BatchConfig { workers },
                None => BatchConfig::default(),
            };
            let runner = BatchRunner::new(Arc::new(pipeline), batch_config);
            let result = runner.run(&documents);

            save_records(&output, &result.records)
                .with_context(|| format!("writing records to {}", output.display()))?;

            let summary = &result.summary;
            println!(
                "attempted: {}, succeeded: {}, skipped: {}",
                summary.attempted, summary.succeeded, summary.skipped
            );
            for skipped in &result.skipped {
                println!("  skipped #{} ({}): {}", skipped.index, skipped.id, skipped.reason);
            }
        }

        Commands::Evaluate {
            records,
            reference,
            json,
        } => {
            let spec = extractor_config.evaluation_spec()?;
            let extracted = load_extracted_records(&records)
                .with_context(|| format!("reading records from {}", records.display()))?;
            let reference_records = load_reference_records(&reference)
                .with_context(|| format!("reading reference from {}", reference.display()))?;

            let report = evaluate(&extracted, &reference_records, &spec);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_table(&report));
            }
        }
    }

    Ok(())
}
