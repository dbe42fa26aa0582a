//! Tick history module
//!
//! Bounded in-memory history of recent ask prices

mod ring;

pub use ring::{RingBuffer, Sample};
