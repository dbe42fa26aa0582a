//! Feed data types

use serde::{Deserialize, Serialize};

/// Fixed-point price (e.g. quote × 1000)
pub type Price = i64;

/// Monotonic tick time in milliseconds
pub type TimeMs = u64;

/// A single bid/ask quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Tick time in milliseconds
    pub time: TimeMs,
    /// Fixed-point ask price
    pub ask: Price,
    /// Fixed-point bid price
    pub bid: Price,
}

impl Tick {
    /// Create a new tick
    pub fn new(time: TimeMs, ask: Price, bid: Price) -> Self {
        Self { time, ask, bid }
    }

    /// Quoted spread in price points
    pub fn spread(&self) -> Price {
        self.ask - self.bid
    }
}
