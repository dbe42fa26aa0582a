//! Data capture module
//!
//! Per-tick feature records and order events, written as CSV

mod recorder;
mod records;

pub use recorder::{CsvRecorder, MemoryRecorder, Recorder, RecorderStats};
pub use records::{bitmap_field, fit_field, OrderEvent, OrderRecord, TickRecord};
