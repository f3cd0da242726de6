//! Market CSV ingest and normalization.
//!
//! This module turns the upstream producer's flat CSV (one row per
//! `(date, symbol)`) into an ordered, validated [`Dataset`].
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level tolerance**: malformed rows are skipped and reported, never fatal
//! - **Natural order preserved**: downstream "Full History" reads the first and
//!   last rows as loaded, so ingest must not re-sort
//! - **Separation of concerns**: no merging or filtering logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::RawRecord;
use crate::error::AppError;

// The source file also carries a legacy `Gold Price` column; it is neither
// required nor read.
const COL_DATE: &str = "date";
const COL_PRICE: &str = "stock price";
const COL_GBI: &str = "gbi";
const COL_SYMBOL: &str = "stock symbol";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub symbol: Option<String>,
    pub message: String,
}

/// Summary stats over the loaded records.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_records: usize,
    pub n_symbols: usize,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
}

/// The loaded market series: records in file order plus ingest diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<RawRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl Dataset {
    /// An empty dataset (the degraded state after a failed load).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap pre-built records (sample mode, tests).
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let n = records.len();
        Self {
            records,
            row_errors: Vec::new(),
            rows_read: n,
            rows_used: n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Date of the first row in load order (not the minimum date).
    pub fn first_row_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    /// Date of the last row in load order (not the maximum date).
    pub fn last_row_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Ascending distinct dates across all symbols: the slider's domain.
    pub fn distinct_dates_sorted(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    pub fn stats(&self) -> Option<DatasetStats> {
        let first = self.records.first()?;
        let mut date_min = first.date;
        let mut date_max = first.date;
        let mut symbols: Vec<&str> = Vec::new();

        for r in &self.records {
            date_min = date_min.min(r.date);
            date_max = date_max.max(r.date);
            if !symbols.contains(&r.symbol.as_str()) {
                symbols.push(&r.symbol);
            }
        }

        Some(DatasetStats {
            n_records: self.records.len(),
            n_symbols: symbols.len(),
            date_min,
            date_max,
        })
    }
}

/// Load and validate the market CSV.
///
/// Malformed rows are collected in `row_errors` and skipped. A readable file
/// with zero usable rows yields an empty dataset, not an error: downstream
/// components degrade to empty catalogs and empty charts.
pub fn load_market_csv(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the header row and CSV line
        // numbers are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    symbol: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(raw) => records.push(raw),
            Err((symbol, message)) => row_errors.push(RowError {
                line,
                symbol,
                message,
            }),
        }
    }

    let rows_used = records.len();
    Ok(Dataset {
        records,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿Date"). Strip it, or schema validation would
    // incorrectly report a missing column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for name in [COL_DATE, COL_PRICE, COL_GBI, COL_SYMBOL] {
        if !header_map.contains_key(name) {
            return Err(AppError::input(format!(
                "Missing required column: `{name}` (expected header: Date, Stock Price, Gold Price, GBI, Stock Symbol)"
            )));
        }
    }
    Ok(())
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<RawRecord, (Option<String>, String)> {
    let symbol = get_required(record, header_map, COL_SYMBOL)
        .map_err(|e| (None, e))?
        .to_string();

    let date = get_required(record, header_map, COL_DATE)
        .and_then(parse_date)
        .map_err(|e| (Some(symbol.clone()), e))?;
    let stock_price = get_required(record, header_map, COL_PRICE)
        .and_then(|s| parse_finite_f64(s, COL_PRICE))
        .map_err(|e| (Some(symbol.clone()), e))?;
    let gbi = get_required(record, header_map, COL_GBI)
        .and_then(|s| parse_finite_f64(s, COL_GBI))
        .map_err(|e| (Some(symbol.clone()), e))?;

    Ok(RawRecord {
        date,
        symbol,
        stock_price,
        gbi,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

/// Parse a calendar date, truncating any time-of-day component to midnight.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD (optionally with a time), YYYY/MM/DD, or MM/DD/YYYY."
    ))
}

fn parse_finite_f64(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if !v.is_finite() {
        return Err(format!("Non-finite `{name}` value '{s}'."));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_well_formed_rows_in_file_order() {
        let path = write_temp_csv(
            "gbi_ingest_basic.csv",
            "Date,Stock Price,Gold Price,GBI,Stock Symbol\n\
             2024-01-02,185.5,190.2,1.02,AAPL\n\
             2024-01-01,184.0,189.9,1.0,AAPL\n\
             2024-01-01,400.0,189.9,1.0,SPY\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert_eq!(dataset.rows_read, 3);
        assert_eq!(dataset.rows_used, 3);
        assert!(dataset.row_errors.is_empty());

        // Load order preserved: first row is 2024-01-02 even though it is not
        // the earliest date.
        assert_eq!(dataset.first_row_date(), Some(d(2024, 1, 2)));
        assert_eq!(dataset.last_row_date(), Some(d(2024, 1, 1)));
        assert_eq!(dataset.records[0].symbol, "AAPL");
        assert!((dataset.records[0].stock_price - 185.5).abs() < 1e-12);
        assert!((dataset.records[0].gbi - 1.02).abs() < 1e-12);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let path = write_temp_csv(
            "gbi_ingest_malformed.csv",
            "Date,Stock Price,Gold Price,GBI,Stock Symbol\n\
             2024-01-01,184.0,189.9,1.0,AAPL\n\
             not-a-date,184.0,189.9,1.0,AAPL\n\
             2024-01-02,oops,189.9,1.0,AAPL\n\
             2024-01-03,185.0,189.9,1.01,AAPL\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert_eq!(dataset.rows_read, 4);
        assert_eq!(dataset.rows_used, 2);
        assert_eq!(dataset.row_errors.len(), 2);
        assert_eq!(dataset.row_errors[0].line, 3);
        assert_eq!(dataset.row_errors[1].line, 4);
        assert_eq!(dataset.row_errors[1].symbol.as_deref(), Some("AAPL"));
    }

    #[test]
    fn datetime_strings_collapse_to_calendar_day() {
        let path = write_temp_csv(
            "gbi_ingest_datetime.csv",
            "Date,Stock Price,Gold Price,GBI,Stock Symbol\n\
             2024-01-01 00:00:00,184.0,189.9,1.0,AAPL\n\
             2024-01-01,400.0,189.9,1.0,SPY\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert_eq!(dataset.records[0].date, d(2024, 1, 1));
        assert_eq!(dataset.records[1].date, d(2024, 1, 1));
    }

    #[test]
    fn bom_prefixed_header_resolves() {
        let path = write_temp_csv(
            "gbi_ingest_bom.csv",
            "\u{feff}Date,Stock Price,Gold Price,GBI,Stock Symbol\n\
             2024-01-01,184.0,189.9,1.0,AAPL\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert_eq!(dataset.rows_used, 1);
    }

    #[test]
    fn missing_gold_column_is_fine() {
        let path = write_temp_csv(
            "gbi_ingest_no_gold.csv",
            "Date,Stock Price,GBI,Stock Symbol\n\
             2024-01-01,184.0,1.0,AAPL\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert_eq!(dataset.rows_used, 1);
    }

    #[test]
    fn missing_required_column_is_an_input_error() {
        let path = write_temp_csv(
            "gbi_ingest_no_gbi.csv",
            "Date,Stock Price,Stock Symbol\n2024-01-01,184.0,AAPL\n",
        );

        let err = load_market_csv(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn header_only_file_yields_empty_dataset() {
        let path = write_temp_csv(
            "gbi_ingest_empty.csv",
            "Date,Stock Price,Gold Price,GBI,Stock Symbol\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.stats().is_none());
        assert!(dataset.distinct_dates_sorted().is_empty());
    }

    #[test]
    fn distinct_dates_are_sorted_and_deduped() {
        let path = write_temp_csv(
            "gbi_ingest_dates.csv",
            "Date,Stock Price,Gold Price,GBI,Stock Symbol\n\
             2024-01-03,1.0,1.0,1.0,AAPL\n\
             2024-01-01,1.0,1.0,1.0,AAPL\n\
             2024-01-01,1.0,1.0,1.0,SPY\n\
             2024-01-02,1.0,1.0,1.0,SPY\n",
        );

        let dataset = load_market_csv(&path).unwrap();
        assert_eq!(
            dataset.distinct_dates_sorted(),
            vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]
        );

        let stats = dataset.stats().unwrap();
        assert_eq!(stats.n_records, 4);
        assert_eq!(stats.n_symbols, 2);
        assert_eq!(stats.date_min, d(2024, 1, 1));
        assert_eq!(stats.date_max, d(2024, 1, 3));
    }
}
