//! Input/output helpers.
//!
//! - market CSV ingest + validation (`ingest`)
//! - wide-table CSV export (`export`)
//! - wide-table JSON snapshot read/write (`snapshot`)

pub mod export;
pub mod ingest;
pub mod snapshot;

pub use export::*;
pub use ingest::*;
pub use snapshot::*;
