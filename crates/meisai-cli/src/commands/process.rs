//! Process command - extract transactions from a single statement file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use meisai_core::{ProcessingResult, StatementProcessor, TransactionRecord};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input statement CSV file
    #[arg(required = true)]
    input: PathBuf,

    /// Directory the input must live under (default: guard.allowed_dir from config)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Show processing details after the output
    #[arg(long)]
    show_stats: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one line per transaction
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let root = args.root.clone().unwrap_or_else(|| config.guard.allowed_dir.clone());

    info!("Processing file: {}", args.input.display());

    let processor = StatementProcessor::new(config);
    let result = match processor.process(&args.input, &root) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{}", serde_json::to_string(&err.to_report())?);
            return Err(err.into());
        }
    };

    let output = format_result(&result, args.format, args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_stats {
        eprintln!();
        eprintln!(
            "{} {} transactions, total {} yen",
            style("ℹ").blue(),
            result.total_count,
            result.summary.total_amount
        );
        eprintln!(
            "{} Encoding: {}, rows scanned: {}",
            style("ℹ").blue(),
            result.metadata.encoding,
            result.metadata.rows_scanned
        );
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.metadata.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a result in the requested format.
pub fn format_result(
    result: &ProcessingResult,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(&result.details),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(records: &[TransactionRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "year",
        "month",
        "month_str",
        "store",
        "user",
        "payment_method",
        "amount",
        "note",
    ])?;

    for record in records {
        wtr.write_record([
            &record.date,
            &record.year.to_string(),
            &record.month.to_string(),
            &record.month_label,
            &record.store,
            &record.user,
            &record.payment_method,
            &record.amount.to_string(),
            &record.note,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ProcessingResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Source: {}\n", result.metadata.source_file.display()));
    output.push_str(&format!("Encoding: {}\n", result.metadata.encoding));
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Transactions: {}\n", result.total_count));
    output.push_str(&format!("  Total:        {} yen\n", result.summary.total_amount));
    output.push_str(&format!(
        "  Period:       {} - {}\n",
        result.summary.date_range.start, result.summary.date_range.end
    ));
    output.push('\n');

    output.push_str(&format!("Preview ({} of {}):\n", result.preview.len(), result.total_count));
    for record in &result.preview {
        output.push_str(&format!(
            "  {}  {:>10}  {}  {}  {}\n",
            record.date, record.amount, record.store, record.user, record.payment_method
        ));
        if !record.note.is_empty() {
            output.push_str(&format!("              {}\n", record.note));
        }
    }

    output
}
