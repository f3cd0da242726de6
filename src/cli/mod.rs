//! Command-line parsing for the GBI market dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::RangeLabel;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gbi", version, about = "GBI market dashboard (terminal)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    ///
    /// This is the default: bare `gbi` (or `gbi -f data.csv`) behaves like
    /// `gbi dash ...`.
    Dash(DashArgs),
    /// Run the merge pipeline once and print a wide-table preview.
    Merge(ViewArgs),
    /// Run the merge pipeline and export the wide table (CSV, or JSON when
    /// the output path ends in `.json`).
    Export(ExportArgs),
    /// Print the derived symbol catalog.
    Symbols(ViewArgs),
    /// Generate a synthetic market CSV in the external file format.
    Sample(SampleArgs),
}

/// Options for the interactive dashboard.
#[derive(Debug, Parser, Clone)]
pub struct DashArgs {
    /// Market CSV (`Date, Stock Price, Gold Price, GBI, Stock Symbol`).
    /// Without it (and without --sample) a picker lists discovered CSVs.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Run on a generated synthetic dataset instead of a file.
    #[arg(long)]
    pub sample: bool,

    /// Baseline symbols (comma-separated), fixed for the session.
    #[arg(long, default_value = "SPY,QQQ,GLD")]
    pub baseline: String,

    /// Business days of synthetic data for --sample.
    #[arg(long, default_value_t = 250)]
    pub sample_days: usize,

    /// Random seed for --sample.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Common options for the one-shot pipeline commands (merge, export, symbols).
#[derive(Debug, Parser, Clone)]
pub struct ViewArgs {
    /// Market CSV (`Date, Stock Price, Gold Price, GBI, Stock Symbol`).
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Run on a generated synthetic dataset instead of a file.
    #[arg(long)]
    pub sample: bool,

    /// Baseline symbols (comma-separated), fixed for the session.
    #[arg(long, default_value = "SPY,QQQ,GLD")]
    pub baseline: String,

    /// Selected tradable symbols (comma-separated).
    /// Default: the first derived tradable symbol.
    #[arg(long)]
    pub symbols: Option<String>,

    /// Selected baseline overlay symbols (comma-separated). Default: all.
    #[arg(long = "baseline-selected")]
    pub baseline_selected: Option<String>,

    /// Predefined date range.
    #[arg(long, value_enum)]
    pub range: Option<RangeLabel>,

    /// Days back from the latest loaded date (slider mode).
    #[arg(long)]
    pub days: Option<usize>,

    /// Explicit window start (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Explicit window end (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Preview row limit for `gbi merge`.
    #[arg(long, default_value_t = 12)]
    pub limit: usize,

    /// Business days of synthetic data for --sample.
    #[arg(long, default_value_t = 250)]
    pub sample_days: usize,

    /// Random seed for --sample.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for exporting the wide table.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output path (`.json` switches to the snapshot format).
    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

/// Options for generating a synthetic market CSV.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output path.
    #[arg(short = 'o', long, default_value = "gbi_sample.csv")]
    pub output: PathBuf,

    /// Business days to generate.
    #[arg(long, default_value_t = 250)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First calendar date of the series.
    #[arg(long, default_value = "2023-01-01")]
    pub start: NaiveDate,
}
