//! Date range selection: predefined labels, slider offsets, explicit bounds.
//!
//! Exactly one mode is active at a time, but each mode keeps its own memory:
//! switching back to the predefined tab re-applies its last label, the slider
//! remembers its last offset, and the calendar keeps its last explicit bounds.
//!
//! Every `apply_*` call returns the resulting [`DateWindow`]; the caller
//! publishes it to shared state, which triggers the downstream recompute.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::domain::{DateWindow, RangeLabel};
use crate::io::ingest::Dataset;

/// Which selection mechanism is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Predefined,
    Slider,
    Calendar,
}

impl RangeMode {
    pub const ALL: [RangeMode; 3] = [RangeMode::Predefined, RangeMode::Slider, RangeMode::Calendar];

    pub fn display_name(self) -> &'static str {
        match self {
            RangeMode::Predefined => "Predefined",
            RangeMode::Slider => "Slider",
            RangeMode::Calendar => "Calendar",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Resolve a predefined label to a window.
///
/// All labels except Full History are functions of wall-clock `today`.
/// Full History reads the first and last rows of the raw dataset in natural
/// load order — deliberately not a min/max scan, and deliberately not relative
/// to `today`. The asymmetry comes from the upstream producer writing each
/// symbol's history in ascending date order; it is preserved here as-is.
pub fn predefined_window(label: RangeLabel, today: NaiveDate, dataset: &Dataset) -> DateWindow {
    let from = match label {
        RangeLabel::Last7Days => today - Duration::days(7),
        RangeLabel::Last30Days => sub_months(today, 1),
        RangeLabel::Mtd => today.with_day(1).unwrap_or(today),
        RangeLabel::Ytd => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        RangeLabel::Last3Months => sub_months(today, 3),
        RangeLabel::Last6Months => sub_months(today, 6),
        RangeLabel::LastYear => sub_months(today, 12),
        RangeLabel::FullHistory => {
            return DateWindow::new(dataset.first_row_date(), dataset.last_row_date());
        }
    };
    DateWindow::bounded(from, today)
}

/// Resolve a "days back" slider offset against the ascending distinct-date
/// sequence of the loaded series.
///
/// `days_back` is clamped to `[1, dates.len()]` rather than erroring. An empty
/// sequence yields an unbounded window (nothing to anchor to).
pub fn slider_window(days_back: usize, dates: &[NaiveDate]) -> DateWindow {
    let Some(last) = dates.last().copied() else {
        return DateWindow::UNBOUNDED;
    };
    let clamped = days_back.clamp(1, dates.len());
    DateWindow::bounded(dates[dates.len() - clamped], last)
}

fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

/// Mode state machine with per-mode memory.
#[derive(Debug, Clone)]
pub struct RangeSelector {
    mode: RangeMode,
    label: RangeLabel,
    days_back: usize,
    calendar: DateWindow,
}

impl Default for RangeSelector {
    fn default() -> Self {
        Self {
            // The dashboard opens on the predefined tab with YTD active.
            mode: RangeMode::Predefined,
            label: RangeLabel::Ytd,
            days_back: 30,
            calendar: DateWindow::UNBOUNDED,
        }
    }
}

impl RangeSelector {
    pub fn mode(&self) -> RangeMode {
        self.mode
    }

    pub fn label(&self) -> RangeLabel {
        self.label
    }

    pub fn days_back(&self) -> usize {
        self.days_back
    }

    pub fn calendar(&self) -> DateWindow {
        self.calendar
    }

    /// Activate a predefined label.
    pub fn apply_predefined(
        &mut self,
        label: RangeLabel,
        today: NaiveDate,
        dataset: &Dataset,
    ) -> DateWindow {
        self.mode = RangeMode::Predefined;
        self.label = label;
        predefined_window(label, today, dataset)
    }

    /// Activate a slider offset; the stored value is the clamped one.
    pub fn apply_slider_offset(&mut self, days_back: usize, dataset: &Dataset) -> DateWindow {
        let dates = dataset.distinct_dates_sorted();
        self.mode = RangeMode::Slider;
        self.days_back = if dates.is_empty() {
            days_back.max(1)
        } else {
            days_back.clamp(1, dates.len())
        };
        slider_window(self.days_back, &dates)
    }

    /// Activate explicit calendar bounds; `to` may still be open while the
    /// user is mid-selection.
    pub fn apply_explicit_range(
        &mut self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DateWindow {
        self.mode = RangeMode::Calendar;
        self.calendar = DateWindow::new(from, to);
        self.calendar
    }

    /// Switch modes, re-applying the target mode's remembered value.
    pub fn set_mode(&mut self, mode: RangeMode, today: NaiveDate, dataset: &Dataset) -> DateWindow {
        match mode {
            RangeMode::Predefined => self.apply_predefined(self.label, today, dataset),
            RangeMode::Slider => self.apply_slider_offset(self.days_back, dataset),
            RangeMode::Calendar => {
                self.mode = RangeMode::Calendar;
                self.calendar
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawRecord;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(date: NaiveDate, symbol: &str) -> RawRecord {
        RawRecord {
            date,
            symbol: symbol.to_string(),
            stock_price: 1.0,
            gbi: 1.0,
        }
    }

    fn dataset(dates: &[NaiveDate]) -> Dataset {
        Dataset::from_records(dates.iter().map(|&dt| record(dt, "AAPL")).collect())
    }

    #[test]
    fn predefined_windows_relative_to_today() {
        let today = d(2024, 3, 15);
        let ds = Dataset::empty();

        let cases = [
            (RangeLabel::Last7Days, d(2024, 3, 8)),
            (RangeLabel::Last30Days, d(2024, 2, 15)),
            (RangeLabel::Mtd, d(2024, 3, 1)),
            (RangeLabel::Ytd, d(2024, 1, 1)),
            (RangeLabel::Last3Months, d(2023, 12, 15)),
            (RangeLabel::Last6Months, d(2023, 9, 15)),
            (RangeLabel::LastYear, d(2023, 3, 15)),
        ];

        for (label, expected_from) in cases {
            let w = predefined_window(label, today, &ds);
            assert_eq!(w.from, Some(expected_from), "{}", label.display_name());
            assert_eq!(w.to, Some(today), "{}", label.display_name());
        }
    }

    #[test]
    fn month_arithmetic_clamps_at_month_end() {
        let w = predefined_window(RangeLabel::Last30Days, d(2024, 3, 31), &Dataset::empty());
        assert_eq!(w.from, Some(d(2024, 2, 29)));
    }

    #[test]
    fn full_history_reads_first_and_last_rows_in_load_order() {
        // First row carries the earliest date, last row the latest, as the
        // upstream producer writes them; any active filter is irrelevant.
        let ds = dataset(&[d(2024, 1, 1), d(2024, 1, 5), d(2024, 2, 1)]);
        let w = predefined_window(RangeLabel::FullHistory, d(2030, 6, 1), &ds);
        assert_eq!(w.from, Some(d(2024, 1, 1)));
        assert_eq!(w.to, Some(d(2024, 2, 1)));
    }

    #[test]
    fn full_history_on_empty_dataset_is_unbounded() {
        let w = predefined_window(RangeLabel::FullHistory, d(2024, 1, 1), &Dataset::empty());
        assert_eq!(w, DateWindow::UNBOUNDED);
    }

    #[test]
    fn slider_offset_one_selects_last_date_only() {
        let dates: Vec<NaiveDate> = (1..=10).map(|day| d(2024, 1, day)).collect();
        let w = slider_window(1, &dates);
        assert_eq!(w, DateWindow::bounded(d(2024, 1, 10), d(2024, 1, 10)));
    }

    #[test]
    fn slider_offset_spans_back_from_latest() {
        let dates: Vec<NaiveDate> = (1..=10).map(|day| d(2024, 1, day)).collect();
        let w = slider_window(3, &dates);
        assert_eq!(w, DateWindow::bounded(d(2024, 1, 8), d(2024, 1, 10)));
    }

    #[test]
    fn slider_offset_clamps_to_available_rows() {
        let dates: Vec<NaiveDate> = (1..=5).map(|day| d(2024, 1, day)).collect();
        let w = slider_window(99, &dates);
        assert_eq!(w, DateWindow::bounded(d(2024, 1, 1), d(2024, 1, 5)));

        let w = slider_window(0, &dates);
        assert_eq!(w, DateWindow::bounded(d(2024, 1, 5), d(2024, 1, 5)));
    }

    #[test]
    fn selector_remembers_each_modes_value() {
        let today = d(2024, 3, 15);
        let ds = dataset(&[d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
        let mut selector = RangeSelector::default();

        selector.apply_predefined(RangeLabel::Mtd, today, &ds);
        selector.apply_slider_offset(2, &ds);
        assert_eq!(selector.mode(), RangeMode::Slider);

        // Switching back to the predefined tab re-applies the last label.
        let w = selector.set_mode(RangeMode::Predefined, today, &ds);
        assert_eq!(selector.label(), RangeLabel::Mtd);
        assert_eq!(w.from, Some(d(2024, 3, 1)));

        // And back to the slider re-applies the last offset.
        let w = selector.set_mode(RangeMode::Slider, today, &ds);
        assert_eq!(w, DateWindow::bounded(d(2024, 1, 2), d(2024, 1, 3)));
    }

    #[test]
    fn explicit_range_keeps_open_end_while_mid_selection() {
        let mut selector = RangeSelector::default();
        let w = selector.apply_explicit_range(Some(d(2024, 1, 10)), None);
        assert_eq!(w.from, Some(d(2024, 1, 10)));
        assert_eq!(w.to, None);
        assert_eq!(selector.mode(), RangeMode::Calendar);

        // The calendar remembers its bounds across a mode round-trip.
        let ds = Dataset::empty();
        selector.set_mode(RangeMode::Predefined, d(2024, 3, 15), &ds);
        let w = selector.set_mode(RangeMode::Calendar, d(2024, 3, 15), &ds);
        assert_eq!(w.from, Some(d(2024, 1, 10)));
    }

    #[test]
    fn mode_cycling_wraps() {
        assert_eq!(RangeMode::Predefined.prev(), RangeMode::Calendar);
        assert_eq!(RangeMode::Calendar.next(), RangeMode::Predefined);
    }
}
