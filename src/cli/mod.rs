//! treetune CLI Module
//!
//! Command-line interface for hyperparameter tuning and data inspection.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::{read_csv, TabularDataset};
use crate::tuner::{tune, Scoring, TunerConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "treetune")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bayesian hyperparameter tuning for boosted tree classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tune booster hyperparameters with cross validated AUC
    Tune(TuneArgs),

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Args)]
pub struct TuneArgs {
    /// Input data file (CSV with a binary target column)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Target column name
    #[arg(short, long, default_value = "response")]
    pub target: String,

    /// Number of stratified cross-validation folds
    #[arg(long, default_value = "5")]
    pub folds: usize,

    /// Total objective evaluations
    #[arg(long, default_value = "10")]
    pub calls: usize,

    /// Random trials before the surrogate model takes over
    #[arg(long, default_value = "10")]
    pub random_starts: usize,

    /// Boosting rounds per trained model
    #[arg(long, default_value = "100")]
    pub estimators: usize,

    /// Fold scoring mode (hard-label, probability)
    #[arg(long, default_value = "hard-label")]
    pub scoring: String,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Suppress per-trial progress lines
    #[arg(long)]
    pub quiet: bool,

    /// Write the full study as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_tune(args: &TuneArgs) -> anyhow::Result<()> {
    section("Tune");

    step_run("Loading data");
    let start = Instant::now();
    let dataset = TabularDataset::from_csv(&args.data, &args.target)?;
    let (negatives, positives) = dataset.class_counts();
    step_done(&format!(
        "{} rows × {} features in {:?}",
        dataset.n_samples(),
        dataset.n_features(),
        start.elapsed()
    ));

    let scoring = match args.scoring.as_str() {
        "hard-label" | "label" => Scoring::HardLabel,
        "probability" | "proba" => Scoring::Probability,
        _ => anyhow::bail!("Invalid scoring: {} (expected hard-label or probability)", args.scoring),
    };

    println!();
    println!("  {:<16} {}", muted("Target"), args.target.white());
    println!("  {:<16} {} / {}", muted("Classes 0/1"), negatives, positives);
    println!("  {:<16} {}", muted("CV folds"), args.folds);
    println!("  {:<16} {} ({} random starts)", muted("Trials"), args.calls, args.random_starts);
    println!("  {:<16} {}", muted("Scoring"), scoring);
    if let Some(seed) = args.seed {
        println!("  {:<16} {}", muted("Seed"), seed);
    }
    println!();

    let mut config = TunerConfig::new()
        .with_target_column(args.target.as_str())
        .with_cv_folds(args.folds)
        .with_scoring(scoring)
        .with_n_calls(args.calls)
        .with_n_random_starts(args.random_starts)
        .with_n_estimators(args.estimators)
        .with_verbose(!args.quiet);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let start = Instant::now();
    let outcome = tune(config, &dataset)?;
    let elapsed = start.elapsed();

    println!();
    println!(
        "  {:<16} {}",
        muted("Best AUC"),
        format!("{:.4}", outcome.mean_auc()).white().bold()
    );
    println!("  {:<16} {}", muted("Time"), format!("{:.2?}", elapsed).white());
    println!();
    println!("  {} {}", ok("best"), outcome.render_params().white().bold());
    println!();

    if let Some(path) = &args.output {
        outcome.study.save(path)?;
        step_ok(&format!("study saved → {}", path.display()));
        println!();
    }

    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = read_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!(
        "  {:<12} {:.2} MB",
        muted("Memory"),
        df.estimated_size() as f64 / 1024.0 / 1024.0
    );
    println!();

    println!(
        "  {:<20} {:<12} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(50)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}
