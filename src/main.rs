use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use survey_insight::engine::PipelineObserver;
use survey_insight::loader::{convert, load_snapshot, ConversionSummary};
use survey_insight::recode::RecodeReport;
use survey_insight::reliability::ReliabilityReport;
use survey_insight::report::{
    render_correlations, render_descriptives, CorrelationTable, DescriptiveTable,
};
use survey_insight::{Composition, PreprocessEngine, StudyConfig};

const DEFAULT_INPUT: &str = "Data/2023년 제7차 근로환경조사 원시자료.csv";
const DEFAULT_SNAPSHOT: &str = "Data/kwcs_full.arrow";

#[derive(Parser)]
#[command(name = "survey-insight")]
#[command(version = "0.1.0")]
#[command(about = "Survey preprocessing and scale reliability pipeline", long_about = None)]
struct Cli {
    /// Log debug detail for every stage
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the raw CSV export into an Arrow snapshot
    Convert {
        /// Path to the raw CSV export
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Path of the snapshot to write
        #[arg(short, long, default_value = DEFAULT_SNAPSHOT)]
        output: PathBuf,

        /// Text encoding of the CSV (WHATWG label); defaults to the study config
        #[arg(short, long)]
        encoding: Option<String>,

        /// Study configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Recode, check reliability, build composites and write the outputs
    Preprocess {
        /// Snapshot written by `convert`
        #[arg(short, long, default_value = DEFAULT_SNAPSHOT)]
        snapshot: PathBuf,

        /// Directory for the output CSV files
        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,

        /// Study configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert, then preprocess
    Run {
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[arg(short, long, default_value = DEFAULT_SNAPSHOT)]
        snapshot: PathBuf,

        #[arg(short = 'd', long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> survey_insight::Result<()> {
    let cli = Cli::parse();
    survey_insight::logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            encoding,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let encoding = encoding.unwrap_or(config.encoding);
            run_convert(&input, &output, &encoding)?;
        }

        Commands::Preprocess {
            snapshot,
            out_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            run_preprocess(&snapshot, &out_dir, config)?;
        }

        Commands::Run {
            input,
            snapshot,
            out_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            run_convert(&input, &snapshot, &config.encoding)?;
            run_preprocess(&snapshot, &out_dir, config)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> survey_insight::Result<StudyConfig> {
    match path {
        Some(path) => StudyConfig::from_json_file(path)
            .with_context(|| format!("failed to load study config {}", path.display())),
        None => Ok(StudyConfig::default()),
    }
}

fn run_convert(input: &Path, output: &Path, encoding: &str) -> survey_insight::Result<()> {
    let summary = convert(input, output, encoding)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    print_conversion(&summary, output);
    Ok(())
}

fn run_preprocess(
    snapshot: &Path,
    out_dir: &Path,
    config: StudyConfig,
) -> survey_insight::Result<()> {
    let mut table = load_snapshot(snapshot)
        .with_context(|| format!("failed to load snapshot {}", snapshot.display()))?;
    println!("Full sample: N = {}", table.len());

    let engine = PreprocessEngine::new(config);
    let mut console = ConsoleObserver;
    let outcome = engine.process(&mut table, &mut console)?;
    engine
        .write_outputs(&outcome, out_dir, &mut console)
        .with_context(|| format!("failed to write outputs to {}", out_dir.display()))?;

    println!("\nFinal sample: N = {}", outcome.composition.rows_after);
    for scale in &outcome.reliability.scales {
        println!("{} alpha = {}", scale.scale, fmt_alpha(scale.result.alpha));
    }
    println!("Next step: hierarchical regression on the analysis data");
    Ok(())
}

fn fmt_alpha(alpha: Option<f64>) -> String {
    alpha
        .map(|a| format!("{:.3}", a))
        .unwrap_or_else(|| "undefined".to_string())
}

fn print_conversion(summary: &ConversionSummary, output: &Path) {
    const MB: f64 = 1024.0 * 1024.0;
    println!("\n=== Conversion ===");
    println!("Rows:         {}", summary.rows);
    println!("Columns:      {}", summary.columns);
    println!("Missing:      {:.2}%", summary.missing_rate);
    println!("CSV size:     {:.1} MB", summary.csv_bytes as f64 / MB);
    println!(
        "Snapshot:     {} ({:.1} MB)",
        output.display(),
        summary.snapshot_bytes as f64 / MB
    );
    println!("CSV load:     {:.1}s", summary.csv_load_time.as_secs_f64());
    println!("Snapshot save: {:.1}s", summary.snapshot_save_time.as_secs_f64());
    println!("Snapshot load: {:.1}s", summary.snapshot_load_time.as_secs_f64());
    if let Some(speedup) = summary.speedup() {
        println!("Speedup:      {:.1}x faster than CSV", speedup);
    }
}

/// Prints each stage's results to stdout
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn recoded(&mut self, report: &RecodeReport) {
        println!("\n=== Sentinel recoding (8, 9 -> missing) ===");
        for (column, count) in report.columns.iter().filter(|(_, n)| *n > 0) {
            println!("  {}: {} values recoded", column, count);
        }
    }

    fn reliability(&mut self, report: &ReliabilityReport) {
        println!("\n=== Scale reliability ===");
        for scale in &report.scales {
            println!("{}:", scale.scale);
            println!("  - items: {}", scale.items.join(", "));
            println!("  - N = {}", scale.result.n_valid);
            println!("  - Cronbach's alpha = {}", fmt_alpha(scale.result.alpha));
            println!(
                "  - mean inter-item r = {:.3}",
                scale.result.mean_inter_item_correlation
            );
        }
    }

    fn composed(&mut self, composition: &Composition) {
        println!("\n=== Preprocessing ===");
        println!(
            "Complete cases: N = {} ({:.1}% of {})",
            composition.rows_after,
            composition.retention(),
            composition.rows_before
        );
        println!(
            "Centered independent composite (mean = {:.3})",
            composition.means.independent
        );
        println!(
            "Centered moderator composite (mean = {:.3})",
            composition.means.moderator
        );
    }

    fn described(&mut self, descriptives: &DescriptiveTable, correlations: &CorrelationTable) {
        println!("\n=== Descriptive statistics ===");
        println!("{}", render_descriptives(descriptives));
        println!("\n=== Correlations ===");
        println!("{}", render_correlations(correlations));
    }

    fn written(&mut self, path: &Path) {
        println!("Saved {}", path.display());
    }
}
