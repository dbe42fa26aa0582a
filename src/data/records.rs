//! Record rows written by the recorders
//!
//! Tick records lead with `time,ask,bid` so a recorded tick file replays
//! as a tick source.

use crate::feature::{BitmapFingerprint, QuadFit, WindowFeatures};
use crate::feed::{Price, Tick, TimeMs};
use crate::position::ClosedPosition;
use crate::signal::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-tick feature record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub time: TimeMs,
    pub ask: Price,
    pub bid: Price,
    /// Normalized trailing ask movement
    pub movement: f64,
    /// `width:factor:hex` per window, joined by `/`
    pub bitmap: String,
    /// `width:c:b:a:r2` per window, joined by `/`
    pub fit: String,
}

impl TickRecord {
    /// Build a record from the features of every window at `tick`
    pub fn new(tick: &Tick, features: &[WindowFeatures], movement: f64) -> Self {
        Self {
            time: tick.time,
            ask: tick.ask,
            bid: tick.bid,
            movement,
            bitmap: join(features.iter().map(bitmap_field)),
            fit: join(features.iter().map(fit_field)),
        }
    }
}

fn join(fields: impl Iterator<Item = String>) -> String {
    fields.collect::<Vec<_>>().join("/")
}

/// Bitmap field of one window; windows without a fingerprint print the sentinel
pub fn bitmap_field(features: &WindowFeatures) -> String {
    match &features.bitmap {
        Ok(fingerprint) => fingerprint.to_string(),
        Err(_) => BitmapFingerprint::sentinel(&features.spec).to_string(),
    }
}

/// Fit field of one window; missing fits print as all zeros
pub fn fit_field(features: &WindowFeatures) -> String {
    let width = features.spec.width_ms;
    match &features.fit {
        Ok(QuadFit {
            a, b, c, r_squared, ..
        }) => format!("{}:{:?}:{:?}:{:?}:{:?}", width, c, b, a, r_squared),
        Err(_) => format!("{}:{:?}:{:?}:{:?}:{:?}", width, 0.0, 0.0, 0.0, 0.0),
    }
}

/// Order lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    Open,
    Close,
    OpenFailed,
    CloseFailed,
}

impl OrderEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEvent::Open => "open",
            OrderEvent::Close => "close",
            OrderEvent::OpenFailed => "open_failed",
            OrderEvent::CloseFailed => "close_failed",
        }
    }
}

/// Order lifecycle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub time: TimeMs,
    pub event: OrderEvent,
    pub side: Side,
    pub width_ms: u64,
    pub price: Price,
    pub lots: Decimal,
    pub pnl_points: Decimal,
    pub detail: String,
}

impl OrderRecord {
    /// Record for a completed close
    pub fn closed(closed: &ClosedPosition) -> Self {
        Self {
            time: closed.close_time,
            event: OrderEvent::Close,
            side: closed.side,
            width_ms: closed.width_ms,
            price: closed.close_price,
            lots: closed.lots,
            pnl_points: closed.pnl_points,
            detail: closed.reason.as_str().to_string(),
        }
    }
}
