//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves the data source (file, picker, or synthetic sample)
//! - drives the shared [`state::DashState`] for one-shot commands
//! - launches the TUI for `gbi dash`

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::cli::{Cli, Command, DashArgs, ExportArgs, SampleArgs, ViewArgs};
use crate::data::sample::{SampleConfig, generate_sample, write_sample_csv};
use crate::error::AppError;
use crate::io::ingest::{Dataset, load_market_csv};
use crate::io::{export, snapshot};

pub mod state;

use self::state::DashState;

/// Entry point for the `gbi` binary.
pub fn run() -> Result<(), AppError> {
    // We want `gbi` and `gbi -f data.csv` to behave like `gbi dash ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    match cli.command {
        Command::Dash(args) => handle_dash(args),
        Command::Merge(args) => handle_merge(args),
        Command::Export(args) => handle_export(args),
        Command::Symbols(args) => handle_symbols(args),
        Command::Sample(args) => handle_sample(args),
    }
}

/// Where the market series comes from. Kept by the TUI so `r` can reload.
#[derive(Debug, Clone)]
pub enum DataSource {
    File(PathBuf),
    Sample(SampleConfig),
}

impl DataSource {
    pub fn load(&self) -> Result<Dataset, AppError> {
        match self {
            DataSource::File(path) => load_market_csv(path),
            DataSource::Sample(config) => {
                Ok(Dataset::from_records(generate_sample(config)?.into_records()))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Sample(config) => {
                format!("synthetic sample (seed {}, {} days)", config.seed, config.days)
            }
        }
    }
}

fn handle_dash(args: DashArgs) -> Result<(), AppError> {
    let source = resolve_source(args.file, args.sample, args.sample_days, args.seed)?;
    let mut state = DashState::new(baseline_symbols(&args.baseline));

    // A failed load degrades to an empty dataset with a visible message; the
    // dashboard itself must come up either way.
    let status = match source.load() {
        Ok(dataset) => {
            let status = load_status(&dataset, &source);
            state.load_dataset(dataset, today());
            status
        }
        Err(err) => {
            state.load_dataset(Dataset::empty(), today());
            format!("Load failed: {err}")
        }
    };

    crate::tui::run(state, source, status)
}

fn handle_merge(args: ViewArgs) -> Result<(), AppError> {
    let state = run_pipeline(&args)?;

    println!(
        "{}",
        crate::report::format_run_summary(state.dataset(), state.catalog(), state.window())
    );
    let warnings = crate::report::format_row_warnings(&state.dataset().row_errors, 5);
    if !warnings.is_empty() {
        eprint!("{warnings}");
    }
    println!("{}", crate::report::format_wide_preview(state.wide(), args.limit));

    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let state = run_pipeline(&args.view)?;

    let is_json = args
        .output
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        == Some(true);

    if is_json {
        snapshot::write_snapshot_json(
            &args.output,
            state.wide(),
            state.window(),
            state.catalog().selected_baseline(),
            state.catalog().selected_tradable(),
        )?;
    } else {
        export::write_wide_csv(&args.output, state.wide())?;
    }

    println!(
        "Wrote {} row(s) to {}",
        state.wide().len(),
        args.output.display()
    );
    Ok(())
}

fn handle_symbols(args: ViewArgs) -> Result<(), AppError> {
    let state = run_pipeline(&args)?;
    print!("{}", crate::report::format_symbols(state.catalog()));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        days: args.days,
        seed: args.seed,
        start: args.start,
    };
    let series = generate_sample(&config)?;
    write_sample_csv(&args.output, &series)?;

    println!(
        "Wrote {} row(s) ({} business days per symbol) to {}",
        series.rows.len(),
        args.days,
        args.output.display()
    );
    Ok(())
}

/// Load, select, and window per the one-shot flags; errors here are the
/// concentrated load-time failures (everything after load is infallible).
fn run_pipeline(args: &ViewArgs) -> Result<DashState, AppError> {
    let source = resolve_source(args.file.clone(), args.sample, args.sample_days, args.seed)?;
    let dataset = source.load()?;

    let mut state = DashState::new(baseline_symbols(&args.baseline));
    state.load_dataset(dataset, today());

    if let Some(symbols) = &args.symbols {
        state.set_selected_tradable(parse_symbol_list(symbols));
    }
    if let Some(symbols) = &args.baseline_selected {
        state.set_selected_baseline(parse_symbol_list(symbols));
    }

    apply_window_args(&mut state, args)?;
    Ok(state)
}

fn apply_window_args(state: &mut DashState, args: &ViewArgs) -> Result<(), AppError> {
    let groups = [
        args.range.is_some(),
        args.days.is_some(),
        args.from.is_some() || args.to.is_some(),
    ];
    if groups.iter().filter(|&&g| g).count() > 1 {
        return Err(AppError::input(
            "Choose at most one of --range, --days, --from/--to.",
        ));
    }

    if let Some(label) = args.range {
        state.apply_predefined(label, today());
    } else if let Some(days) = args.days {
        state.apply_slider_offset(days);
    } else {
        // One-shots default to the whole dataset; the explicit bounds may
        // still both be open.
        state.apply_explicit_range(args.from, args.to);
    }
    Ok(())
}

fn resolve_source(
    file: Option<PathBuf>,
    sample: bool,
    sample_days: usize,
    seed: u64,
) -> Result<DataSource, AppError> {
    if sample {
        return Ok(DataSource::Sample(SampleConfig {
            days: sample_days,
            seed,
            start: default_sample_start(),
        }));
    }
    match file {
        Some(path) => Ok(DataSource::File(path)),
        None => Ok(DataSource::File(crate::cli::picker::prompt_for_csv_path()?)),
    }
}

fn load_status(dataset: &Dataset, source: &DataSource) -> String {
    if dataset.is_empty() {
        format!("No usable rows in {}", source.describe())
    } else {
        format!(
            "Loaded {} row(s) from {}",
            dataset.rows_used,
            source.describe()
        )
    }
}

fn parse_symbol_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The configured baseline, falling back to the stock reference set when the
/// flag parses to nothing (e.g. `--baseline ""`).
fn baseline_symbols(input: &str) -> Vec<String> {
    let parsed = parse_symbol_list(input);
    if parsed.is_empty() {
        crate::domain::DEFAULT_BASELINE
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        parsed
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_sample_start() -> NaiveDate {
    // Matches the upstream producer's historical window start.
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_else(|| Local::now().date_naive())
}

/// Rewrite argv so `gbi` defaults to `gbi dash`.
///
/// Rules:
/// - `gbi`                      -> `gbi dash`
/// - `gbi -f data.csv ...`      -> `gbi dash -f data.csv ...`
/// - `gbi --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dash".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "dash" | "merge" | "export" | "symbols" | "sample"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "dash flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dash".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
