//! Pivot the flat market series into the wide table charts consume.
//!
//! This is the one place the reshaping happens: every consumer (TUI charts,
//! CSV export, JSON snapshot) reads the already-filtered, already-sorted
//! output instead of re-deriving its own variant.
//!
//! The merge is a total recompute: a pure function of its four inputs, rebuilt
//! from scratch on every call. At this system's scale (thousands of rows, tens
//! of symbols) that is cheaper than maintaining any incremental structure.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::domain::{ColumnKey, DateWindow, RawRecord, SeriesField, WideRow};

/// Merge the raw series into one wide row per distinct in-window date.
///
/// Baseline symbols are merged first, then tradable symbols; the two sets are
/// disjoint by catalog construction, so the pass order never changes the
/// result (columns are keyed per symbol). Rows missing a selected symbol on a
/// given date simply omit that symbol's columns.
pub fn merge(
    raw: &[RawRecord],
    selected_baseline: &[String],
    selected_tradable: &[String],
    window: &DateWindow,
) -> Vec<WideRow> {
    let mut rows: BTreeMap<NaiveDate, WideRow> = BTreeMap::new();

    merge_selection(raw, selected_baseline, window, &mut rows);
    merge_selection(raw, selected_tradable, window, &mut rows);

    // BTreeMap iteration is ascending by date, so the output order is the
    // sort required of the wide table.
    rows.into_values().collect()
}

fn merge_selection(
    raw: &[RawRecord],
    symbols: &[String],
    window: &DateWindow,
    rows: &mut BTreeMap<NaiveDate, WideRow>,
) {
    if symbols.is_empty() {
        return;
    }
    let selected: HashSet<&str> = symbols.iter().map(String::as_str).collect();

    for record in raw {
        if !selected.contains(record.symbol.as_str()) || !window.contains(record.date) {
            continue;
        }

        let row = rows
            .entry(record.date)
            .or_insert_with(|| WideRow::new(record.date));
        row.columns.insert(
            ColumnKey::new(record.symbol.clone(), SeriesField::Price),
            record.stock_price,
        );
        row.columns.insert(
            ColumnKey::new(record.symbol.clone(), SeriesField::Gbi),
            record.gbi,
        );
    }
}

/// The union of column keys across all rows, in deterministic order.
///
/// Exports and chart legends use this as the column header set; a column
/// appears here even if only a single row carries it.
pub fn column_keys(rows: &[WideRow]) -> Vec<ColumnKey> {
    let mut keys: BTreeSet<&ColumnKey> = BTreeSet::new();
    for row in rows {
        keys.extend(row.columns.keys());
    }
    keys.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(date: NaiveDate, symbol: &str, price: f64, gbi: f64) -> RawRecord {
        RawRecord {
            date,
            symbol: symbol.to_string(),
            stock_price: price,
            gbi,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Two symbols with partially overlapping histories, unbounded window.
    fn sample_raw() -> Vec<RawRecord> {
        vec![
            record(d(2024, 1, 1), "AAPL", 100.0, 1.0),
            record(d(2024, 1, 2), "AAPL", 102.0, 1.02),
            record(d(2024, 1, 1), "SPY", 400.0, 1.0),
        ]
    }

    #[test]
    fn merges_overlapping_histories_into_sparse_rows() {
        let rows = merge(
            &sample_raw(),
            &strings(&["SPY"]),
            &strings(&["AAPL"]),
            &DateWindow::UNBOUNDED,
        );

        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(first.date, d(2024, 1, 1));
        assert_eq!(first.value("AAPL", SeriesField::Price), Some(100.0));
        assert_eq!(first.value("AAPL", SeriesField::Gbi), Some(1.0));
        assert_eq!(first.value("SPY", SeriesField::Price), Some(400.0));
        assert_eq!(first.value("SPY", SeriesField::Gbi), Some(1.0));

        // SPY has no row on the 2nd: its columns must be absent, not zero.
        let second = &rows[1];
        assert_eq!(second.date, d(2024, 1, 2));
        assert_eq!(second.value("AAPL", SeriesField::Price), Some(102.0));
        assert_eq!(second.value("AAPL", SeriesField::Gbi), Some(1.02));
        assert_eq!(second.value("SPY", SeriesField::Price), None);
        assert_eq!(second.value("SPY", SeriesField::Gbi), None);
        assert_eq!(second.columns.len(), 2);
    }

    #[test]
    fn window_filter_is_inclusive_on_both_bounds() {
        let rows = merge(
            &sample_raw(),
            &strings(&["SPY"]),
            &strings(&["AAPL"]),
            &DateWindow::bounded(d(2024, 1, 2), d(2024, 1, 2)),
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, d(2024, 1, 2));
        // Only AAPL traded that day.
        assert_eq!(column_keys(&rows).len(), 2);
        assert!(rows[0].value("SPY", SeriesField::Price).is_none());
    }

    #[test]
    fn empty_selection_yields_empty_table() {
        let rows = merge(&sample_raw(), &[], &[], &DateWindow::UNBOUNDED);
        assert!(rows.is_empty());
    }

    #[test]
    fn inverted_window_yields_empty_table() {
        let rows = merge(
            &sample_raw(),
            &strings(&["SPY"]),
            &strings(&["AAPL"]),
            &DateWindow::bounded(d(2024, 2, 1), d(2024, 1, 1)),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_selected_symbol_is_inert() {
        let rows = merge(
            &sample_raw(),
            &strings(&["SPY"]),
            &strings(&["AAPL", "ZZZZ"]),
            &DateWindow::UNBOUNDED,
        );

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row.value("ZZZZ", SeriesField::Price).is_none());
        }
    }

    #[test]
    fn merge_is_deterministic() {
        let raw = sample_raw();
        let baseline = strings(&["SPY"]);
        let tradable = strings(&["AAPL"]);
        let window = DateWindow::new(Some(d(2024, 1, 1)), None);

        let a = merge(&raw, &baseline, &tradable, &window);
        let b = merge(&raw, &baseline, &tradable, &window);
        assert_eq!(a, b);
    }

    #[test]
    fn output_dates_strictly_ascend_regardless_of_input_order() {
        let raw = vec![
            record(d(2024, 1, 3), "AAPL", 3.0, 1.3),
            record(d(2024, 1, 1), "AAPL", 1.0, 1.1),
            record(d(2024, 1, 2), "SPY", 2.0, 1.2),
            record(d(2024, 1, 1), "SPY", 1.5, 1.0),
        ];

        let rows = merge(
            &raw,
            &strings(&["SPY"]),
            &strings(&["AAPL"]),
            &DateWindow::UNBOUNDED,
        );

        assert_eq!(rows.len(), 3);
        for pair in rows.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn half_open_windows_admit_one_side() {
        let raw = sample_raw();
        let baseline = strings(&["SPY"]);
        let tradable = strings(&["AAPL"]);

        let from_only = merge(
            &raw,
            &baseline,
            &tradable,
            &DateWindow::new(Some(d(2024, 1, 2)), None),
        );
        assert_eq!(from_only.len(), 1);
        assert_eq!(from_only[0].date, d(2024, 1, 2));

        let to_only = merge(
            &raw,
            &baseline,
            &tradable,
            &DateWindow::new(None, Some(d(2024, 1, 1))),
        );
        assert_eq!(to_only.len(), 1);
        assert_eq!(to_only[0].date, d(2024, 1, 1));
    }

    #[test]
    fn unselected_symbols_contribute_nothing() {
        let rows = merge(
            &sample_raw(),
            &[],
            &strings(&["AAPL"]),
            &DateWindow::UNBOUNDED,
        );

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row.value("SPY", SeriesField::Price).is_none());
        }
    }

    #[test]
    fn column_keys_union_is_ordered_and_complete() {
        let rows = merge(
            &sample_raw(),
            &strings(&["SPY"]),
            &strings(&["AAPL"]),
            &DateWindow::UNBOUNDED,
        );

        let keys = column_keys(&rows);
        let labels: Vec<String> = keys.iter().map(ColumnKey::label).collect();
        assert_eq!(
            labels,
            vec!["AAPL Price", "AAPL GBI", "SPY Price", "SPY GBI"]
        );
    }
}
