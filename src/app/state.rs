//! The shared application-state aggregate.
//!
//! One `DashState` owns everything the dashboard mutates: the loaded dataset,
//! the symbol catalog and selections, the range selector, the active window,
//! and the last computed wide table. UI code dispatches intents through the
//! methods here and reads projections back; it never touches the fields
//! directly, so there is exactly one writer per field and no drift between
//! near-duplicate merge paths.
//!
//! Every mutation re-runs the merge before returning. The recompute is a pure
//! function over in-memory data, so there is nothing to cancel or retry.

use chrono::NaiveDate;

use crate::catalog::SymbolCatalog;
use crate::dates::{RangeMode, RangeSelector};
use crate::domain::{DateWindow, RangeLabel, WideRow};
use crate::io::ingest::Dataset;
use crate::merge;

#[derive(Debug, Clone)]
pub struct DashState {
    dataset: Dataset,
    catalog: SymbolCatalog,
    selector: RangeSelector,
    window: DateWindow,
    wide: Vec<WideRow>,
    is_loading: bool,
}

impl DashState {
    /// A fresh state with the configured baseline and nothing loaded yet.
    ///
    /// `is_loading` starts true so the UI shows its loading placeholder until
    /// the first `load_dataset` call, successful or degraded.
    pub fn new(baseline: Vec<String>) -> Self {
        Self {
            dataset: Dataset::empty(),
            catalog: SymbolCatalog::new(baseline),
            selector: RangeSelector::default(),
            window: DateWindow::UNBOUNDED,
            wide: Vec::new(),
            is_loading: true,
        }
    }

    /// Install a (re)loaded dataset.
    ///
    /// Rederives the catalog (which bootstraps the default selection),
    /// re-applies the active range mode against the new data, and recomputes.
    /// An empty dataset is valid: everything degrades to empty projections.
    pub fn load_dataset(&mut self, dataset: Dataset, today: NaiveDate) {
        self.dataset = dataset;
        self.catalog.rederive(&self.dataset.records);
        self.window = self
            .selector
            .set_mode(self.selector.mode(), today, &self.dataset);
        self.is_loading = false;
        self.recompute();
    }

    pub fn set_selected_tradable(&mut self, symbols: Vec<String>) {
        self.catalog.set_selected_tradable(symbols);
        self.recompute();
    }

    pub fn set_selected_baseline(&mut self, symbols: Vec<String>) {
        self.catalog.set_selected_baseline(symbols);
        self.recompute();
    }

    pub fn toggle_tradable(&mut self, symbol: &str) {
        self.catalog.toggle_tradable(symbol);
        self.recompute();
    }

    pub fn toggle_baseline(&mut self, symbol: &str) {
        self.catalog.toggle_baseline(symbol);
        self.recompute();
    }

    pub fn apply_predefined(&mut self, label: RangeLabel, today: NaiveDate) {
        self.window = self.selector.apply_predefined(label, today, &self.dataset);
        self.recompute();
    }

    pub fn apply_slider_offset(&mut self, days_back: usize) {
        self.window = self.selector.apply_slider_offset(days_back, &self.dataset);
        self.recompute();
    }

    /// Explicit calendar bounds; publishes even mid-selection (`to` open).
    pub fn apply_explicit_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.window = self.selector.apply_explicit_range(from, to);
        self.recompute();
    }

    /// Switch the range mode, re-applying that mode's remembered value.
    pub fn set_range_mode(&mut self, mode: RangeMode, today: NaiveDate) {
        self.window = self.selector.set_mode(mode, today, &self.dataset);
        self.recompute();
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn selector(&self) -> &RangeSelector {
        &self.selector
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// The last computed wide table (already filtered and date-sorted).
    pub fn wide(&self) -> &[WideRow] {
        &self.wide
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn recompute(&mut self) {
        self.wide = merge::merge(
            &self.dataset.records,
            self.catalog.selected_baseline(),
            self.catalog.selected_tradable(),
            &self.window,
        );
    }
}
