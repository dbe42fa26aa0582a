//! Window extraction from the tick history

use super::FeatureError;
use crate::feed::{Price, TimeMs};
use crate::history::{RingBuffer, Sample};

/// Samples inside one lookback window, newest first
///
/// Prices are normalized against the current price so that the current
/// sample sits at `normalize_to`.
#[derive(Debug, Clone)]
pub struct Window {
    /// Window width in milliseconds
    pub width_ms: u64,
    /// Time of the current (newest) sample
    pub current_time: TimeMs,
    /// First time included in the window
    pub start_time: TimeMs,
    /// Normalization divisor: current price / normalize_to
    pub rate: f64,
    /// Normalized price level of the current sample
    pub normalize_to: Price,
    /// Samples with `time >= start_time`, newest first
    pub samples: Vec<Sample>,
    /// Whether history reaches back before `start_time`
    pub complete: bool,
}

impl Window {
    /// Collect the window ending at logical index `current`
    ///
    /// A window is complete when a sample older than its start was seen, or
    /// when such samples existed but have been overwritten in the ring (the
    /// window is then silently truncated to the retained history).
    pub fn collect(
        ring: &RingBuffer,
        current: u64,
        width_ms: u64,
        normalize_to: Price,
    ) -> Result<Self, FeatureError> {
        let head = ring
            .get(current)
            .ok_or(FeatureError::InsufficientHistory { width_ms })?;
        if head.price <= 0 || normalize_to <= 0 {
            return Err(FeatureError::InvalidPrice(head.price));
        }
        let rate = head.price as f64 / normalize_to as f64;

        let reachable = head.time + 1 >= width_ms;
        let start_time = (head.time + 1).saturating_sub(width_ms);

        let mut samples = Vec::new();
        let mut reached_before = false;
        for (_, sample) in ring.iter_back(current) {
            if sample.time < start_time {
                reached_before = true;
                break;
            }
            samples.push(sample);
        }

        Ok(Self {
            width_ms,
            current_time: head.time,
            start_time,
            rate,
            normalize_to,
            samples,
            complete: reachable && (reached_before || ring.has_wrapped()),
        })
    }

    /// Normalized integer price (truncated toward zero)
    pub fn normalized(&self, price: Price) -> Price {
        (price as f64 / self.rate) as Price
    }

    /// Normalized integer price relative to `normalize_to`
    pub fn relative(&self, price: Price) -> Price {
        self.normalized(price) - self.normalize_to
    }

    /// Fit coordinates: (ms before now, normalized price offset)
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| {
                (
                    s.time as f64 - self.current_time as f64,
                    s.price as f64 / self.rate - self.normalize_to as f64,
                )
            })
            .collect()
    }

    /// Average milliseconds between samples, if at least two are present
    pub fn ms_per_tick(&self) -> Option<f64> {
        match self.samples.len() {
            0 | 1 => None,
            n => Some(self.width_ms as f64 / (n - 1) as f64),
        }
    }
}
