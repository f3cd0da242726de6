//! Export the merged wide table to CSV.
//!
//! The export mirrors the renderer contract: a `Date` column plus one column
//! per `(symbol, field)` label, sparse holes left as empty cells (never 0).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::WideRow;
use crate::error::AppError;
use crate::merge::column_keys;

/// Write the wide table to a CSV file.
///
/// The header is the deterministic union of columns across all rows, so a
/// symbol that traded on only one in-window date still gets its columns.
pub fn write_wide_csv(path: &Path, rows: &[WideRow]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::input(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    let keys = column_keys(rows);

    let mut header = String::from("Date");
    for key in &keys {
        header.push(',');
        header.push_str(&key.label());
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        let mut line = row.date.to_string();
        for key in &keys {
            line.push(',');
            if let Some(value) = row.columns.get(key) {
                line.push_str(&format!("{value}"));
            }
        }
        writeln!(file, "{line}")
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
