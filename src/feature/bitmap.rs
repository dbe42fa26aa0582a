//! Bitmap fingerprint encoding
//!
//! Rasterizes a window onto a `bit_width × bit_height` grid. Prices are
//! normalized against the current price, then quantized with the smallest
//! integer step that keeps every in-window price inside the grid with the
//! current price near the vertical middle.

use super::{BitmapFingerprint, FeatureError, IncompletePolicy, Window, WindowSpec};
use crate::feed::Price;

/// Smallest price step that fits `[min_rel, max_rel]` around the middle row
///
/// Rows below the middle hold `bit_height / 2` steps, rows above hold
/// `bit_height / 2 - 1`. Never returns less than 1.
pub fn price_factor(min_rel: Price, max_rel: Price, bit_height: u32) -> u32 {
    let below = (bit_height / 2).max(1) as i64;
    let above = (bit_height / 2).saturating_sub(1).max(1) as i64;
    let down = (-min_rel).max(0);
    let up = max_rel.max(0);
    let factor = (down + below - 1) / below;
    let factor = factor.max((up + above - 1) / above);
    factor.clamp(1, u32::MAX as i64) as u32
}

/// Row of a price `price_diff` points above the grid floor
///
/// Prices below the floor or above the top row are not drawn.
fn grid_row(price_diff: Price, factor: u32, height: i64) -> Option<usize> {
    if price_diff < 0 {
        return None;
    }
    let row = price_diff / factor as i64;
    (row < height).then_some(row as usize)
}

/// Encodes windows of one configured width
#[derive(Debug, Clone)]
pub struct BitmapEncoder {
    spec: WindowSpec,
    policy: IncompletePolicy,
}

impl BitmapEncoder {
    /// Create an encoder for a window spec
    pub fn new(spec: WindowSpec, policy: IncompletePolicy) -> Self {
        Self { spec, policy }
    }

    /// Window spec this encoder rasterizes
    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    /// Encode a window into a fingerprint
    pub fn encode(&self, window: &Window) -> Result<BitmapFingerprint, FeatureError> {
        if !window.complete {
            return match self.policy {
                IncompletePolicy::Skip => Err(FeatureError::InsufficientHistory {
                    width_ms: self.spec.width_ms,
                }),
                IncompletePolicy::Sentinel => Ok(BitmapFingerprint::sentinel(&self.spec)),
            };
        }

        let (mut min_rel, mut max_rel) = (0, 0);
        for sample in &window.samples {
            let rel = window.relative(sample.price);
            min_rel = min_rel.min(rel);
            max_rel = max_rel.max(rel);
        }

        let height = self.spec.bit_height as i64;
        let factor = price_factor(min_rel, max_rel, self.spec.bit_height);
        let min_price = window.normalize_to - (height / 2) * factor as i64;
        let time_factor = self.spec.time_factor();

        let mut bytes = vec![0u8; self.spec.byte_count()];
        for sample in &window.samples {
            let time_index = (sample.time - window.start_time) / time_factor;
            if time_index >= self.spec.bit_width as u64 {
                continue;
            }
            let Some(price_index) =
                grid_row(window.normalized(sample.price) - min_price, factor, height)
            else {
                continue;
            };
            let pos = price_index + time_index as usize * self.spec.bit_height as usize;
            bytes[pos / 8] |= 1 << (pos % 8);
        }

        Ok(BitmapFingerprint {
            width_ms: self.spec.width_ms,
            price_factor: factor,
            bytes,
        })
    }
}
