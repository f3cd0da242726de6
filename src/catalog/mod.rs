//! Symbol catalog: baseline/tradable partition and the current selections.
//!
//! The baseline set is fixed at startup; the tradable set is derived from the
//! loaded dataset as "distinct symbols minus baseline", in first-occurrence
//! order. The two partitions never overlap.
//!
//! Selection setters replace the current selection wholesale and perform no
//! validation against the catalog: a selected symbol that never appears in the
//! raw data simply contributes no columns downstream.

use std::collections::HashSet;

use crate::domain::RawRecord;

#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    baseline: Vec<String>,
    tradable: Vec<String>,
    selected_tradable: Vec<String>,
    selected_baseline: Vec<String>,
}

/// Collect distinct symbols from `raw` in first-occurrence order, excluding
/// anything in `baseline`.
///
/// Pure function; empty input yields an empty result.
pub fn derive_symbols(raw: &[RawRecord], baseline: &[String]) -> Vec<String> {
    let excluded: HashSet<&str> = baseline.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();

    for record in raw {
        let symbol = record.symbol.as_str();
        if excluded.contains(symbol) || !seen.insert(symbol) {
            continue;
        }
        out.push(record.symbol.clone());
    }

    out
}

impl SymbolCatalog {
    /// Create a catalog with the given baseline set and no tradable symbols.
    ///
    /// The baseline is deduplicated preserving order; all baseline symbols
    /// start selected.
    pub fn new(baseline: Vec<String>) -> Self {
        let baseline = dedup_preserving_order(baseline);
        let selected_baseline = baseline.clone();
        Self {
            baseline,
            tradable: Vec::new(),
            selected_tradable: Vec::new(),
            selected_baseline,
        }
    }

    /// Recompute the tradable partition from a (re)loaded dataset.
    ///
    /// Bootstraps the default selection: when the derived list is non-empty,
    /// `selected_tradable` resets to the singleton first element; otherwise it
    /// is cleared. This is a side effect of derivation, not a user action.
    pub fn rederive(&mut self, raw: &[RawRecord]) {
        self.tradable = derive_symbols(raw, &self.baseline);
        self.selected_tradable = match self.tradable.first() {
            Some(first) => vec![first.clone()],
            None => Vec::new(),
        };
    }

    /// Replace the tradable selection wholesale (duplicates dropped).
    pub fn set_selected_tradable(&mut self, symbols: Vec<String>) {
        self.selected_tradable = dedup_preserving_order(symbols);
    }

    /// Replace the baseline selection wholesale (duplicates dropped).
    pub fn set_selected_baseline(&mut self, symbols: Vec<String>) {
        self.selected_baseline = dedup_preserving_order(symbols);
    }

    /// Add or remove one tradable symbol from the selection.
    pub fn toggle_tradable(&mut self, symbol: &str) {
        toggle(&mut self.selected_tradable, symbol);
    }

    /// Add or remove one baseline symbol from the selection.
    pub fn toggle_baseline(&mut self, symbol: &str) {
        toggle(&mut self.selected_baseline, symbol);
    }

    pub fn baseline(&self) -> &[String] {
        &self.baseline
    }

    pub fn tradable(&self) -> &[String] {
        &self.tradable
    }

    pub fn selected_tradable(&self) -> &[String] {
        &self.selected_tradable
    }

    pub fn selected_baseline(&self) -> &[String] {
        &self.selected_baseline
    }

    pub fn is_tradable_selected(&self, symbol: &str) -> bool {
        self.selected_tradable.iter().any(|s| s == symbol)
    }

    pub fn is_baseline_selected(&self, symbol: &str) -> bool {
        self.selected_baseline.iter().any(|s| s == symbol)
    }
}

fn dedup_preserving_order(symbols: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn toggle(selection: &mut Vec<String>, symbol: &str) {
    if let Some(idx) = selection.iter().position(|s| s == symbol) {
        selection.remove(idx);
    } else {
        selection.push(symbol.to_string());
    }
}
