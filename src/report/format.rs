//! Terminal report formatting: dataset summary, ingest warnings, wide preview.

use crate::catalog::SymbolCatalog;
use crate::domain::{DateWindow, WideRow};
use crate::io::ingest::{Dataset, RowError};
use crate::merge::column_keys;

/// Format the run summary: ingest counts, date span, catalog, window.
pub fn format_run_summary(
    dataset: &Dataset,
    catalog: &SymbolCatalog,
    window: DateWindow,
) -> String {
    let mut out = String::new();

    out.push_str("=== gbi - market dashboard ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        dataset.rows_read,
        dataset.rows_used,
        dataset.row_errors.len()
    ));

    match dataset.stats() {
        Some(stats) => {
            out.push_str(&format!(
                "Span: {} .. {} | symbols={}\n",
                stats.date_min, stats.date_max, stats.n_symbols
            ));
        }
        None => out.push_str("Span: (no data)\n"),
    }

    out.push_str(&format!(
        "Baseline: {} (selected: {})\n",
        catalog.baseline().join(", "),
        join_or_dash(catalog.selected_baseline()),
    ));
    out.push_str(&format!(
        "Tradable: {} (selected: {})\n",
        join_or_dash(catalog.tradable()),
        join_or_dash(catalog.selected_tradable()),
    ));
    out.push_str(&format!("Window: {}\n", format_window(window)));

    out
}

/// Format skipped-row warnings (at most `max` detail lines).
pub fn format_row_warnings(errors: &[RowError], max: usize) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("Warning: skipped {} malformed row(s):\n", errors.len()));
    for err in errors.iter().take(max) {
        match &err.symbol {
            Some(symbol) => {
                out.push_str(&format!("  line {} [{}]: {}\n", err.line, symbol, err.message));
            }
            None => out.push_str(&format!("  line {}: {}\n", err.line, err.message)),
        }
    }
    if errors.len() > max {
        out.push_str(&format!("  ... and {} more\n", errors.len() - max));
    }
    out
}

/// Format the catalog listing for `gbi symbols`.
pub fn format_symbols(catalog: &SymbolCatalog) -> String {
    let mut out = String::new();

    out.push_str("Baseline symbols:\n");
    for symbol in catalog.baseline() {
        let marker = if catalog.is_baseline_selected(symbol) { "*" } else { " " };
        out.push_str(&format!("{marker} {symbol}\n"));
    }

    out.push_str("Tradable symbols:\n");
    if catalog.tradable().is_empty() {
        out.push_str("  (none)\n");
    }
    for symbol in catalog.tradable() {
        let marker = if catalog.is_tradable_selected(symbol) { "*" } else { " " };
        out.push_str(&format!("{marker} {symbol}\n"));
    }

    out
}

/// Format a preview of the wide table: header plus up to `limit` rows from the
/// head and tail, with an ellipsis marker in between when truncated.
pub fn format_wide_preview(rows: &[WideRow], limit: usize) -> String {
    let mut out = String::new();

    if rows.is_empty() {
        out.push_str("(empty wide table)\n");
        return out;
    }

    let keys = column_keys(rows);

    out.push_str(&format!("{:<12}", "Date"));
    for key in &keys {
        out.push_str(&format!(" {:>14}", key.label()));
    }
    out.push('\n');

    out.push_str(&format!("{:-<12}", ""));
    for _ in &keys {
        out.push_str(&format!(" {:->14}", ""));
    }
    out.push('\n');

    let limit = limit.max(2);
    let head = limit.div_ceil(2);
    let tail = limit - head;

    if rows.len() <= limit {
        for row in rows {
            push_preview_row(&mut out, row, &keys);
        }
    } else {
        for row in &rows[..head] {
            push_preview_row(&mut out, row, &keys);
        }
        out.push_str(&format!("... ({} rows elided)\n", rows.len() - limit));
        for row in &rows[rows.len() - tail..] {
            push_preview_row(&mut out, row, &keys);
        }
    }

    out.push_str(&format!("{} row(s), {} column(s)\n", rows.len(), keys.len()));
    out
}

fn push_preview_row(out: &mut String, row: &WideRow, keys: &[crate::domain::ColumnKey]) {
    out.push_str(&format!("{:<12}", row.date.to_string()));
    for key in keys {
        match row.columns.get(key) {
            Some(value) => out.push_str(&format!(" {:>14.4}", value)),
            None => out.push_str(&format!(" {:>14}", "-")),
        }
    }
    out.push('\n');
}

pub fn format_window(window: DateWindow) -> String {
    match (window.from, window.to) {
        (Some(from), Some(to)) => format!("{from} .. {to}"),
        (Some(from), None) => format!("{from} .. (open)"),
        (None, Some(to)) => format!("(open) .. {to}"),
        (None, None) => "(unbounded)".to_string(),
    }
}

fn join_or_dash(symbols: &[String]) -> String {
    if symbols.is_empty() {
        "-".to_string()
    } else {
        symbols.join(", ")
    }
}
