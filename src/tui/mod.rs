//! Ratatui-based dashboard.
//!
//! Two stacked trend charts (stock price and GBI) over a settings panel for
//! the date range modes and the symbol selections. All data mutations go
//! through [`DashState`]; this module only translates key presses into intents
//! and renders the resulting projections.

use std::io;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::DataSource;
use crate::app::state::DashState;
use crate::dates::RangeMode;
use crate::domain::SeriesField;
use crate::error::AppError;
use crate::report::format_window;

mod plotters_chart;

use plotters_chart::{ChartSeries, TrendPlottersChart};

const FIELD_MODE: usize = 0;
const FIELD_VALUE: usize = 1;
const FIELD_STOCKS: usize = 2;
const FIELD_BASELINE: usize = 3;
const FIELD_COUNT: usize = 4;

/// Start the dashboard.
pub fn run(state: DashState, source: DataSource, status: String) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(state, source, status);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    state: DashState,
    source: DataSource,
    selected_field: usize,
    stock_cursor: usize,
    baseline_cursor: usize,
    editing_range: bool,
    range_input: String,
    status: String,
}

impl App {
    fn new(state: DashState, source: DataSource, status: String) -> Self {
        Self {
            state,
            source,
            selected_field: 0,
            stock_cursor: 0,
            baseline_cursor: 0,
            editing_range: false,
            range_input: String::new(),
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_range {
            self.handle_range_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_COUNT - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char(' ') => self.toggle_at_cursor(),
            KeyCode::Enter => {
                if self.selected_field == FIELD_VALUE
                    && self.state.selector().mode() == RangeMode::Calendar
                {
                    self.editing_range = true;
                    self.range_input = range_input_from_window(&self.state);
                    self.status =
                        "Editing range (YYYY-MM-DD..YYYY-MM-DD). Enter to apply, Esc to cancel."
                            .to_string();
                }
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('e') => self.export_csv(),
            KeyCode::Char('s') => self.write_snapshot(),
            _ => {}
        }

        false
    }

    fn handle_range_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_range = false;
                self.status = "Range edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_range = false;
                match parse_range_input(&self.range_input) {
                    Ok((from, to)) => {
                        self.state.apply_explicit_range(from, to);
                        self.status = format!("Window: {}", format_window(self.state.window()));
                    }
                    Err(message) => self.status = message,
                }
            }
            KeyCode::Backspace => {
                self.range_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '-' || c == '.' {
                    self.range_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            FIELD_MODE => {
                let mode = if delta >= 0 {
                    self.state.selector().mode().next()
                } else {
                    self.state.selector().mode().prev()
                };
                self.state.set_range_mode(mode, today());
                self.status = format!(
                    "mode: {} | window: {}",
                    mode.display_name(),
                    format_window(self.state.window())
                );
            }
            FIELD_VALUE => match self.state.selector().mode() {
                RangeMode::Predefined => {
                    let label = if delta >= 0 {
                        self.state.selector().label().next()
                    } else {
                        self.state.selector().label().prev()
                    };
                    self.state.apply_predefined(label, today());
                    self.status = format!(
                        "range: {} | window: {}",
                        label.display_name(),
                        format_window(self.state.window())
                    );
                }
                RangeMode::Slider => {
                    let days = self.state.selector().days_back();
                    let days = if delta >= 0 {
                        days.saturating_add(1)
                    } else {
                        days.saturating_sub(1).max(1)
                    };
                    self.state.apply_slider_offset(days);
                    self.status = format!("days back: {}", self.state.selector().days_back());
                }
                RangeMode::Calendar => {
                    self.status = "Press Enter to edit the calendar range.".to_string();
                }
            },
            FIELD_STOCKS => {
                move_cursor(&mut self.stock_cursor, self.state.catalog().tradable().len(), delta);
            }
            FIELD_BASELINE => {
                move_cursor(
                    &mut self.baseline_cursor,
                    self.state.catalog().baseline().len(),
                    delta,
                );
            }
            _ => {}
        }
    }

    fn toggle_at_cursor(&mut self) {
        match self.selected_field {
            FIELD_STOCKS => {
                let Some(symbol) = self
                    .state
                    .catalog()
                    .tradable()
                    .get(self.stock_cursor)
                    .cloned()
                else {
                    return;
                };
                self.state.toggle_tradable(&symbol);
                self.status = format!(
                    "stocks: {}",
                    join_or_dash(self.state.catalog().selected_tradable())
                );
            }
            FIELD_BASELINE => {
                let Some(symbol) = self
                    .state
                    .catalog()
                    .baseline()
                    .get(self.baseline_cursor)
                    .cloned()
                else {
                    return;
                };
                self.state.toggle_baseline(&symbol);
                self.status = format!(
                    "baseline: {}",
                    join_or_dash(self.state.catalog().selected_baseline())
                );
            }
            _ => {}
        }
    }

    fn reload(&mut self) {
        match self.source.load() {
            Ok(dataset) => {
                let rows = dataset.rows_used;
                let skipped = dataset.row_errors.len();
                self.state.load_dataset(dataset, today());
                self.stock_cursor = 0;
                self.baseline_cursor = 0;
                self.status = if skipped > 0 {
                    format!("Reloaded {rows} row(s), skipped {skipped} malformed.")
                } else {
                    format!("Reloaded {rows} row(s).")
                };
            }
            Err(err) => {
                self.status = format!("Reload failed: {err}");
            }
        }
    }

    fn export_csv(&mut self) {
        let ts = Local::now().format("%Y%m%d_%H%M%S");
        let path = std::path::PathBuf::from(format!("gbi_wide_{ts}.csv"));
        match crate::io::export::write_wide_csv(&path, self.state.wide()) {
            Ok(()) => {
                self.status = format!(
                    "Wrote {} row(s) to {}",
                    self.state.wide().len(),
                    path.display()
                );
            }
            Err(err) => self.status = format!("Export failed: {err}"),
        }
    }

    fn write_snapshot(&mut self) {
        let ts = Local::now().format("%Y%m%d_%H%M%S");
        let path = std::path::PathBuf::from(format!("gbi_snapshot_{ts}.json"));
        match crate::io::snapshot::write_snapshot_json(
            &path,
            self.state.wide(),
            self.state.window(),
            self.state.catalog().selected_baseline(),
            self.state.catalog().selected_tradable(),
        ) {
            Ok(()) => self.status = format!("Wrote snapshot to {}", path.display()),
            Err(err) => self.status = format!("Snapshot failed: {err}"),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("gbi", Style::default().fg(Color::Cyan)),
            Span::raw(" — stock price & gold-base-index trends"),
        ]));

        lines.push(Line::from(Span::styled(
            format!("source: {}", self.source.describe()),
            Style::default().fg(Color::Gray),
        )));

        let stats = self
            .state
            .dataset()
            .stats()
            .map(|s| format!("{} rows | {} symbols", s.n_records, s.n_symbols))
            .unwrap_or_else(|| "no data".to_string());
        lines.push(Line::from(Span::styled(
            format!(
                "{stats} | window: {} | view: {} row(s)",
                format_window(self.state.window()),
                self.state.wide().len()
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(area);

        let charts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        self.draw_chart(frame, charts[0], SeriesField::Price, "Price Trend");
        self.draw_chart(frame, charts[1], SeriesField::Gbi, "GBI Trend");
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        field: SeriesField,
        title: &str,
    ) {
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.state.is_loading() {
            let msg = Paragraph::new("Loading data...").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let (series, x_bounds, y_bounds) = chart_series(&self.state, field);
        if series.iter().all(|s| s.runs.iter().all(|run| run.is_empty())) {
            let msg = Paragraph::new("No data in the selected view.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let widget = TrendPlottersChart {
            series: &series,
            x_bounds,
            y_bounds,
            x_label: "date",
            y_label: field.display_name(),
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let selector = self.state.selector();
        let value_text = match selector.mode() {
            RangeMode::Predefined => selector.label().display_name().to_string(),
            RangeMode::Slider => format!("{} day(s) back", selector.days_back()),
            RangeMode::Calendar => format_window(selector.calendar()),
        };

        let items = vec![
            ListItem::new(format!("Mode: {}", selector.mode().display_name())),
            ListItem::new(format!("Range: {value_text}")),
            ListItem::new(format!(
                "Stocks: {}",
                symbol_row(
                    self.state.catalog().tradable(),
                    self.stock_cursor,
                    |s| self.state.catalog().is_tradable_selected(s),
                )
            )),
            ListItem::new(format!(
                "Baseline: {}",
                symbol_row(
                    self.state.catalog().baseline(),
                    self.baseline_cursor,
                    |s| self.state.catalog().is_baseline_selected(s),
                )
            )),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut list_state = ratatui::widgets::ListState::default();
        list_state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut list_state);

        if self.editing_range {
            let hint = Paragraph::new(format!("range: {}_", self.range_input)).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ field  ←/→ adjust  Space toggle  Enter edit  r reload  e export  s snapshot  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Build the drawable series for one chart: selected baselines (dashed) first,
/// then selected tradables, with gap-preserving runs and padded bounds.
fn chart_series(state: &DashState, field: SeriesField) -> (Vec<ChartSeries>, [f64; 2], [f64; 2]) {
    let rows = state.wide();
    let catalog = state.catalog();

    let mut series = Vec::new();
    for symbol in catalog.selected_baseline() {
        series.push(ChartSeries {
            color: baseline_color(symbol),
            dashed: true,
            runs: split_runs(rows, symbol, field),
        });
    }
    for (idx, symbol) in catalog.selected_tradable().iter().enumerate() {
        series.push(ChartSeries {
            color: palette_color(idx),
            dashed: false,
            runs: split_runs(rows, symbol, field),
        });
    }

    let x_bounds = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => {
            let x0 = epoch_day(first.date);
            let x1 = epoch_day(last.date);
            // A single-date view still needs a non-degenerate axis.
            if x1 <= x0 { [x0 - 1.0, x0 + 1.0] } else { [x0, x1] }
        }
        _ => [0.0, 1.0],
    };

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in &series {
        for run in &s.runs {
            for &(_, y) in run {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-9);
    let y_bounds = [y_min - pad, y_max + pad];

    (series, x_bounds, y_bounds)
}

/// Split one symbol's column into contiguous runs of points.
///
/// Dates where the symbol has no value end the current run, so the chart
/// shows a gap there instead of a straight interpolated segment.
fn split_runs(
    rows: &[crate::domain::WideRow],
    symbol: &str,
    field: SeriesField,
) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for row in rows {
        match row.value(symbol, field) {
            Some(value) => current.push((epoch_day(row.date), value)),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn epoch_day(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn fmt_axis_date(v: f64) -> String {
    match NaiveDate::from_num_days_from_ce_opt(v.round() as i32) {
        Some(date) => format!("{}/{}", date.month(), date.day()),
        None => "-".to_string(),
    }
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.2}")
}

/// Fixed colors for the stock baselines; custom baselines fall back to the
/// tradable palette.
fn baseline_color(symbol: &str) -> RGBColor {
    match symbol {
        "SPY" => RGBColor(239, 68, 68),  // red
        "QQQ" => RGBColor(139, 92, 246), // purple
        "GLD" => RGBColor(245, 158, 11), // amber
        _ => palette_color(symbol.len()),
    }
}

fn palette_color(index: usize) -> RGBColor {
    const PALETTE: [RGBColor; 8] = [
        RGBColor(37, 99, 235),   // blue
        RGBColor(16, 185, 129),  // emerald
        RGBColor(249, 115, 22),  // orange
        RGBColor(139, 92, 246),  // purple
        RGBColor(236, 72, 153),  // pink
        RGBColor(20, 184, 166),  // teal
        RGBColor(132, 204, 22),  // lime
        RGBColor(99, 102, 241),  // indigo
    ];
    PALETTE[index % PALETTE.len()]
}

fn move_cursor(cursor: &mut usize, len: usize, delta: i32) {
    if len == 0 {
        *cursor = 0;
        return;
    }
    if delta >= 0 {
        *cursor = (*cursor + 1).min(len - 1);
    } else {
        *cursor = cursor.saturating_sub(1);
    }
}

fn symbol_row<F: Fn(&str) -> bool>(symbols: &[String], cursor: usize, is_selected: F) -> String {
    if symbols.is_empty() {
        return "(none)".to_string();
    }
    let parts: Vec<String> = symbols
        .iter()
        .enumerate()
        .map(|(idx, symbol)| {
            let mark = if is_selected(symbol) { "*" } else { "" };
            if idx == cursor {
                format!("[{symbol}{mark}]")
            } else {
                format!("{symbol}{mark}")
            }
        })
        .collect();
    parts.join(" ")
}

fn range_input_from_window(state: &DashState) -> String {
    let window = state.selector().calendar();
    match (window.from, window.to) {
        (Some(from), Some(to)) => format!("{from}..{to}"),
        (Some(from), None) => format!("{from}.."),
        _ => String::new(),
    }
}

/// Parse `YYYY-MM-DD..YYYY-MM-DD`, either side optional; a bare date sets only
/// the start (the mid-selection shape).
fn parse_range_input(input: &str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok((None, None));
    }

    let (from_text, to_text) = match trimmed.split_once("..") {
        Some((a, b)) => (a.trim(), b.trim()),
        None => (trimmed, ""),
    };

    let parse = |text: &str| -> Result<Option<NaiveDate>, String> {
        if text.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| format!("Invalid date '{text}': {e}"))
    };

    let from = parse(from_text)?;
    let to = parse(to_text)?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(format!("Range start {from} is after end {to}."));
        }
    }

    Ok((from, to))
}

fn join_or_dash(symbols: &[String]) -> String {
    if symbols.is_empty() {
        "-".to_string()
    } else {
        symbols.join(", ")
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
