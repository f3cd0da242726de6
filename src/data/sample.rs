//! Synthetic market series generation.
//!
//! Mirrors the upstream producer's output: for each symbol, a business-day
//! price path plus a shared gold path, with `GBI = price / gold` normalized to
//! 1.0 on the first date. Rows are emitted grouped by symbol, each block in
//! ascending date order — the same natural order the real file has, which the
//! Full History range relies on.

use std::collections::hash_map::DefaultHasher;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::RawRecord;
use crate::error::AppError;

/// Big-seven tradable symbols, then the baselines, as the producer writes them.
pub const SAMPLE_SYMBOLS: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "GLD", "QQQ", "SPY",
];

const GOLD_START: f64 = 180.0;
const GOLD_DAILY_VOL: f64 = 0.008;
const STOCK_DAILY_VOL: f64 = 0.02;
const STOCK_DAILY_DRIFT: f64 = 0.0005;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Number of business days to generate.
    pub days: usize,
    pub seed: u64,
    pub start: NaiveDate,
}

/// One generated row in the external file format (gold included).
#[derive(Debug, Clone)]
pub struct SampleRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub stock_price: f64,
    pub gold_price: f64,
    pub gbi: f64,
}

#[derive(Debug, Clone)]
pub struct SampleSeries {
    pub rows: Vec<SampleRow>,
}

impl SampleSeries {
    /// The rows as the core consumes them (gold column dropped).
    pub fn into_records(self) -> Vec<RawRecord> {
        self.rows
            .into_iter()
            .map(|row| RawRecord {
                date: row.date,
                symbol: row.symbol,
                stock_price: row.stock_price,
                gbi: row.gbi,
            })
            .collect()
    }
}

/// Generate a deterministic synthetic series for all sample symbols.
pub fn generate_sample(config: &SampleConfig) -> Result<SampleSeries, AppError> {
    if config.days == 0 {
        return Err(AppError::input("Sample day count must be > 0."));
    }

    let dates = business_days(config.start, config.days);
    let gold = gold_path(config.seed, dates.len())?;

    let mut rows = Vec::with_capacity(SAMPLE_SYMBOLS.len() * dates.len());
    for symbol in SAMPLE_SYMBOLS {
        // GLD's "stock price" is the gold path itself, so its GBI is a flat
        // 1.0 — the same artifact the real producer emits.
        let prices = if symbol == "GLD" {
            gold.clone()
        } else {
            stock_path(config.seed, symbol, dates.len())?
        };

        let first_ratio = prices[0] / gold[0];
        for (i, &date) in dates.iter().enumerate() {
            let ratio = prices[i] / gold[i];
            rows.push(SampleRow {
                date,
                symbol: symbol.to_string(),
                stock_price: prices[i],
                gold_price: gold[i],
                gbi: ratio / first_ratio,
            });
        }
    }

    Ok(SampleSeries { rows })
}

/// Write the series in the external CSV format.
pub fn write_sample_csv(path: &Path, series: &SampleSeries) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create sample CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "Date,Stock Price,Gold Price,GBI,Stock Symbol")
        .map_err(|e| AppError::input(format!("Failed to write sample CSV header: {e}")))?;

    for row in &series.rows {
        writeln!(
            file,
            "{},{:.4},{:.4},{:.6},{}",
            row.date, row.stock_price, row.gold_price, row.gbi, row.symbol
        )
        .map_err(|e| AppError::input(format!("Failed to write sample CSV row: {e}")))?;
    }

    Ok(())
}

/// The first `count` business days starting at `start` (weekends skipped).
fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = start;
    while dates.len() < count {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current = current + Duration::days(1);
    }
    dates
}

fn gold_path(seed: u64, len: usize) -> Result<Vec<f64>, AppError> {
    random_walk(symbol_seed(seed, "GLD"), GOLD_START, 0.0, GOLD_DAILY_VOL, len)
}

fn stock_path(seed: u64, symbol: &str, len: usize) -> Result<Vec<f64>, AppError> {
    let mut rng = StdRng::seed_from_u64(symbol_seed(seed, symbol));
    let start = rng.gen_range(50.0..500.0);
    random_walk(
        symbol_seed(seed, symbol).wrapping_add(1),
        start,
        STOCK_DAILY_DRIFT,
        STOCK_DAILY_VOL,
        len,
    )
}

fn random_walk(
    seed: u64,
    start: f64,
    drift: f64,
    vol: f64,
    len: usize,
) -> Result<Vec<f64>, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let mut out = Vec::with_capacity(len);
    let mut price = start;
    for _ in 0..len {
        out.push(price);
        let z: f64 = normal.sample(&mut rng);
        price *= (drift + vol * z).exp();
    }
    Ok(out)
}

fn symbol_seed(seed: u64, symbol: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    symbol.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SampleConfig {
        SampleConfig {
            days: 20,
            seed: 42,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let a = generate_sample(&config()).unwrap();
        let b = generate_sample(&config()).unwrap();
        assert_eq!(a.rows.len(), b.rows.len());
        for (ra, rb) in a.rows.iter().zip(&b.rows) {
            assert_eq!(ra.date, rb.date);
            assert_eq!(ra.symbol, rb.symbol);
            assert_eq!(ra.stock_price.to_bits(), rb.stock_price.to_bits());
            assert_eq!(ra.gbi.to_bits(), rb.gbi.to_bits());
        }
    }

    #[test]
    fn gbi_normalizes_to_one_on_the_first_date() {
        let series = generate_sample(&config()).unwrap();
        for symbol in SAMPLE_SYMBOLS {
            let first = series
                .rows
                .iter()
                .find(|r| r.symbol == symbol)
                .expect("symbol present");
            assert!(
                (first.gbi - 1.0).abs() < 1e-12,
                "{symbol} first GBI was {}",
                first.gbi
            );
        }
    }

    #[test]
    fn gld_gbi_stays_flat_at_one() {
        let series = generate_sample(&config()).unwrap();
        for row in series.rows.iter().filter(|r| r.symbol == "GLD") {
            assert!((row.gbi - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn weekends_are_skipped() {
        let series = generate_sample(&config()).unwrap();
        for row in &series.rows {
            assert!(!matches!(
                row.date.weekday(),
                Weekday::Sat | Weekday::Sun
            ));
        }
    }

    #[test]
    fn rows_are_grouped_by_symbol_with_ascending_dates() {
        let series = generate_sample(&config()).unwrap();
        let days = config().days;
        assert_eq!(series.rows.len(), SAMPLE_SYMBOLS.len() * days);

        for (block, symbol) in SAMPLE_SYMBOLS.iter().enumerate() {
            let rows = &series.rows[block * days..(block + 1) * days];
            for row in rows {
                assert_eq!(&row.symbol, symbol);
            }
            for pair in rows.windows(2) {
                assert!(pair[0].date < pair[1].date);
            }
        }

        // First row is the earliest date, last row the latest: the natural
        // order Full History depends on.
        let first = series.rows.first().unwrap().date;
        let last = series.rows.last().unwrap().date;
        assert!(series.rows.iter().all(|r| r.date >= first));
        assert!(series.rows.iter().all(|r| r.date <= last));
    }

    #[test]
    fn into_records_drops_gold_only() {
        let series = generate_sample(&config()).unwrap();
        let n = series.rows.len();
        let gbi0 = series.rows[0].gbi;
        let records = series.into_records();
        assert_eq!(records.len(), n);
        assert!((records[0].gbi - gbi0).abs() < 1e-15);
    }

    #[test]
    fn zero_days_is_rejected() {
        let err = generate_sample(&SampleConfig {
            days: 0,
            ..config()
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
