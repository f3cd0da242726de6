//! Read/write wide-table JSON snapshots.
//!
//! The snapshot is the "portable" representation of one dashboard view:
//! - the active window and selections that produced it
//! - the merged rows with renderer-facing column labels
//!
//! External chart renderers consume exactly this shape: label-keyed column
//! maps with absent keys meaning "no point plotted at this x".

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DateWindow, WideRow};
use crate::error::AppError;

/// One snapshot row: column labels (`"<SYMBOL> Price"` / `"<SYMBOL> GBI"`)
/// mapped to values. Sparse, like the wide row it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub date: NaiveDate,
    pub columns: BTreeMap<String, f64>,
}

/// A saved dashboard view (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub tool: String,
    pub window: DateWindow,
    pub selected_baseline: Vec<String>,
    pub selected_tradable: Vec<String>,
    pub rows: Vec<SnapshotRow>,
}

/// Convert wide rows to the label-keyed snapshot shape.
pub fn snapshot_rows(rows: &[WideRow]) -> Vec<SnapshotRow> {
    rows.iter()
        .map(|row| SnapshotRow {
            date: row.date,
            columns: row
                .columns
                .iter()
                .map(|(key, value)| (key.label(), *value))
                .collect(),
        })
        .collect()
}

/// Write a snapshot JSON file.
pub fn write_snapshot_json(
    path: &Path,
    rows: &[WideRow],
    window: DateWindow,
    selected_baseline: &[String],
    selected_tradable: &[String],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create snapshot JSON '{}': {e}",
            path.display()
        ))
    })?;

    let snapshot = SnapshotFile {
        tool: "gbi".to_string(),
        window,
        selected_baseline: selected_baseline.to_vec(),
        selected_tradable: selected_tradable.to_vec(),
        rows: snapshot_rows(rows),
    };

    serde_json::to_writer_pretty(file, &snapshot)
        .map_err(|e| AppError::input(format!("Failed to write snapshot JSON: {e}")))?;

    Ok(())
}

/// Read a snapshot JSON file.
pub fn read_snapshot_json(path: &Path) -> Result<SnapshotFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!(
            "Failed to open snapshot JSON '{}': {e}",
            path.display()
        ))
    })?;
    let snapshot: SnapshotFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid snapshot JSON: {e}")))?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnKey, SeriesField};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn snapshot_rows_use_renderer_labels() {
        let mut row = WideRow::new(d(2024, 1, 1));
        row.columns
            .insert(ColumnKey::new("AAPL", SeriesField::Price), 100.0);
        row.columns
            .insert(ColumnKey::new("AAPL", SeriesField::Gbi), 1.0);

        let rows = snapshot_rows(&[row]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns.get("AAPL Price"), Some(&100.0));
        assert_eq!(rows[0].columns.get("AAPL GBI"), Some(&1.0));
        assert!(!rows[0].columns.contains_key("SPY Price"));
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let mut row = WideRow::new(d(2024, 1, 2));
        row.columns
            .insert(ColumnKey::new("SPY", SeriesField::Gbi), 1.5);

        let path = std::env::temp_dir().join("gbi_snapshot_roundtrip.json");
        write_snapshot_json(
            &path,
            &[row],
            DateWindow::bounded(d(2024, 1, 1), d(2024, 1, 31)),
            &["SPY".to_string()],
            &["AAPL".to_string()],
        )
        .unwrap();

        let snapshot = read_snapshot_json(&path).unwrap();
        assert_eq!(snapshot.tool, "gbi");
        assert_eq!(snapshot.window.from, Some(d(2024, 1, 1)));
        assert_eq!(snapshot.selected_tradable, ["AAPL".to_string()]);
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].columns.get("SPY GBI"), Some(&1.5));
    }
}
