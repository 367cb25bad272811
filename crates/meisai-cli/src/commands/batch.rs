//! Batch processing command for multiple statement files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use meisai_core::{ProcessingResult, StatementError, StatementProcessor};

use super::load_config;
use super::process::{format_result, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Directory the inputs must live under (default: guard.allowed_dir from config)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    index: usize,
    path: PathBuf,
    result: Result<ProcessingResult, StatementError>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let root = args.root.clone().unwrap_or_else(|| config.guard.allowed_dir.clone());

    let files = expand_inputs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    let processor = Arc::new(StatementProcessor::new(config));
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut join_set = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let processor = Arc::clone(&processor);
        let permits = Arc::clone(&permits);
        let root = root.clone();

        join_set.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let task_path = path.clone();
            let file_start = Instant::now();
            let result = tokio::task::spawn_blocking(move || processor.process(&task_path, &root))
                .await
                .unwrap_or_else(|e| Err(StatementError::processing(&e, Default::default())));

            FileOutcome {
                index,
                path,
                result,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        });
    }

    let mut outcomes = Vec::with_capacity(join_set.len());
    while let Some(joined) = join_set.join_next().await {
        let outcome = joined?;
        pb.inc(1);

        if let Err(err) = &outcome.result {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), err);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), err);
                join_set.abort_all();
                pb.abandon();
                eprintln!("{}", serde_json::to_string(&err.to_report())?);
                anyhow::bail!("Processing failed for {}: {}", outcome.path.display(), err);
            }
        }
        outcomes.push(outcome);
    }

    pb.finish_and_clear();
    outcomes.sort_by_key(|o| o.index);

    if let Some(output_dir) = &args.output_dir {
        for outcome in &outcomes {
            if let Ok(result) = &outcome.result {
                let output_path = output_path_for(output_dir, &outcome.path, args.format);
                fs::write(&output_path, format_result(result, args.format, false)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args.output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    let succeeded = outcomes.len() - failed.len();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(succeeded).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(err) = &outcome.result {
                println!("  - {}: {}", outcome.path.display(), err);
            }
        }
    }

    Ok(())
}

/// Expand a glob pattern to the `.csv` files it matches, in path order.
fn expand_inputs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn output_path_for(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statement");
    output_dir.join(format!("{}.{}", stem, format.extension()))
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "encoding",
        "total_count",
        "total_amount",
        "start_date",
        "end_date",
        "processing_time_ms",
        "error_type",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = outcome.processing_time_ms.to_string();

        match &outcome.result {
            Ok(result) => {
                wtr.write_record([
                    filename,
                    "success",
                    &result.metadata.encoding,
                    &result.total_count.to_string(),
                    &result.summary.total_amount.to_string(),
                    &result.summary.date_range.start,
                    &result.summary.date_range.end,
                    &time,
                    "",
                    "",
                ])?;
            }
            Err(err) => {
                let kind = serde_json::to_value(err.kind())?;
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &time,
                    kind.as_str().unwrap_or(""),
                    err.message(),
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
