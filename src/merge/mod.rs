//! The series merge engine.
//!
//! Responsibilities:
//!
//! - filter the flat dataset by selected symbols and the active window
//! - pivot row-per-(date, symbol) records into row-per-date wide rows
//! - keep the output strictly date-ordered and sparse (no fabricated values)

pub mod engine;

pub use engine::*;
