//! Utility helpers

pub mod records;

pub use records::{RecordWriter, RunSummary};
