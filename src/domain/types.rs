//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during the reactive merge recompute
//! - exported to CSV/JSON for downstream chart renderers
//! - compared directly in tests

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Baseline reference symbols, always available for comparison overlay.
///
/// Fixed at startup (overridable via `--baseline`), never derived from data.
pub const DEFAULT_BASELINE: [&str; 3] = ["SPY", "QQQ", "GLD"];

/// One source row: a single symbol's observation on a single date.
///
/// `(date, symbol)` pairs are expected unique. Not every symbol has a row for
/// every date; the merge engine must not fabricate values for the holes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub stock_price: f64,
    pub gbi: f64,
}

/// Which of the two per-symbol series a wide-table column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesField {
    Price,
    Gbi,
}

impl SeriesField {
    /// Suffix used in renderer-facing column labels.
    pub fn display_name(self) -> &'static str {
        match self {
            SeriesField::Price => "Price",
            SeriesField::Gbi => "GBI",
        }
    }
}

/// Identity of one wide-table column: a `(symbol, field)` pair.
///
/// Columns are keyed by this pair rather than by formatted strings; the
/// `"<SYMBOL> Price"` / `"<SYMBOL> GBI"` labels downstream renderers expect
/// are derived at the export boundary via [`ColumnKey::label`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnKey {
    pub symbol: String,
    pub field: SeriesField,
}

impl ColumnKey {
    pub fn new(symbol: impl Into<String>, field: SeriesField) -> Self {
        Self {
            symbol: symbol.into(),
            field,
        }
    }

    /// Renderer-facing column label, e.g. `AAPL Price` or `SPY GBI`.
    pub fn label(&self) -> String {
        format!("{} {}", self.symbol, self.field.display_name())
    }
}

/// One merged output row: every column value observed on one calendar date.
///
/// `columns` is sparse: a selected symbol with no raw row on this date simply
/// has no entries. A `BTreeMap` keeps column iteration deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub date: NaiveDate,
    pub columns: BTreeMap<ColumnKey, f64>,
}

impl WideRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            columns: BTreeMap::new(),
        }
    }

    pub fn value(&self, symbol: &str, field: SeriesField) -> Option<f64> {
        self.columns
            .get(&ColumnKey::new(symbol, field))
            .copied()
    }
}

/// Inclusive date window used to filter the merge.
///
/// A `None` bound is unbounded on that side. Comparison is at calendar-date
/// granularity; time-of-day never reaches this type (ingest truncates it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub const UNBOUNDED: DateWindow = DateWindow {
        from: None,
        to: None,
    };

    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn bounded(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// True when `date` satisfies both bounds (inclusive).
    ///
    /// An inverted window (`from > to`) admits nothing, by construction.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Named predefined date ranges for quick selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum RangeLabel {
    #[value(name = "7d")]
    Last7Days,
    #[value(name = "30d")]
    Last30Days,
    #[value(name = "mtd")]
    Mtd,
    #[value(name = "ytd")]
    Ytd,
    #[value(name = "3m")]
    Last3Months,
    #[value(name = "6m")]
    Last6Months,
    #[value(name = "1y")]
    LastYear,
    #[value(name = "full")]
    FullHistory,
}

impl RangeLabel {
    pub const ALL: [RangeLabel; 8] = [
        RangeLabel::Last7Days,
        RangeLabel::Last30Days,
        RangeLabel::Mtd,
        RangeLabel::Ytd,
        RangeLabel::Last3Months,
        RangeLabel::Last6Months,
        RangeLabel::LastYear,
        RangeLabel::FullHistory,
    ];

    /// Human-readable label for selector widgets and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            RangeLabel::Last7Days => "Last 7 Days",
            RangeLabel::Last30Days => "Last 30 Days",
            RangeLabel::Mtd => "MTD",
            RangeLabel::Ytd => "YTD",
            RangeLabel::Last3Months => "Last 3 Months",
            RangeLabel::Last6Months => "Last 6 Months",
            RangeLabel::LastYear => "Last Year",
            RangeLabel::FullHistory => "Full History",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn column_label_matches_renderer_contract() {
        assert_eq!(ColumnKey::new("AAPL", SeriesField::Price).label(), "AAPL Price");
        assert_eq!(ColumnKey::new("SPY", SeriesField::Gbi).label(), "SPY GBI");
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let w = DateWindow::bounded(d(2024, 1, 2), d(2024, 1, 4));
        assert!(!w.contains(d(2024, 1, 1)));
        assert!(w.contains(d(2024, 1, 2)));
        assert!(w.contains(d(2024, 1, 4)));
        assert!(!w.contains(d(2024, 1, 5)));
    }

    #[test]
    fn unbounded_sides_admit_everything() {
        let w = DateWindow::new(None, Some(d(2024, 1, 4)));
        assert!(w.contains(d(1970, 1, 1)));
        assert!(!w.contains(d(2024, 1, 5)));
        assert!(DateWindow::UNBOUNDED.contains(d(2999, 12, 31)));
    }

    #[test]
    fn inverted_window_admits_nothing() {
        let w = DateWindow::bounded(d(2024, 2, 1), d(2024, 1, 1));
        assert!(!w.contains(d(2024, 1, 15)));
        assert!(!w.contains(d(2024, 2, 1)));
    }

    #[test]
    fn range_label_cycling_wraps() {
        assert_eq!(RangeLabel::Last7Days.prev(), RangeLabel::FullHistory);
        assert_eq!(RangeLabel::FullHistory.next(), RangeLabel::Last7Days);
        assert_eq!(RangeLabel::Ytd.next(), RangeLabel::Last3Months);
    }
}
