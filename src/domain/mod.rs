//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw market observations (`RawRecord`)
//! - wide-table output types (`ColumnKey`, `SeriesField`, `WideRow`)
//! - date-window types (`DateWindow`, `RangeLabel`)

pub mod types;

pub use types::*;
