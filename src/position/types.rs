//! Position types

use crate::execution::OrderHandle;
use crate::feed::{Price, Tick, TimeMs};
use crate::signal::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One venue order that is part of a position
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub handle: OrderHandle,
    pub lots: Decimal,
}

/// The single logical position
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub open_time: TimeMs,
    /// Entry price (ask for buys, bid for sells)
    pub open_price: Price,
    /// Price the periodic close check compares against
    pub reference_price: Price,
    /// Window width that triggered the open
    pub width_ms: u64,
    /// Legs still open
    pub legs: Vec<Leg>,
    /// Periodic checks passed without closing
    pub checks_done: u32,
    /// Earliest tick time of the next periodic check
    pub next_check_at: TimeMs,
    /// Lots opened across all legs
    pub opened_lots: Decimal,
    /// Lot-weighted points realized by legs already closed
    pub realized_points: Decimal,
    pub provenance: String,
}

impl Position {
    /// Price the position closes at on this tick
    pub fn close_price(&self, tick: &Tick) -> Price {
        match self.side {
            Side::Buy => tick.bid,
            Side::Sell => tick.ask,
        }
    }

    /// Per-unit points gained if closed at `price`
    pub fn points_at(&self, price: Price) -> Price {
        match self.side {
            Side::Buy => price - self.open_price,
            Side::Sell => self.open_price - price,
        }
    }

    /// Lots still open
    pub fn open_lots(&self) -> Decimal {
        self.legs.iter().map(|leg| leg.lots).sum()
    }
}

/// Lifecycle state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Idle,
    Active(Position),
}

impl PositionState {
    /// Whether a position is open
    pub fn is_active(&self) -> bool {
        matches!(self, PositionState::Active(_))
    }

    /// The open position, if any
    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Active(position) => Some(position),
            PositionState::Idle => None,
        }
    }
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Periodic reference check failed
    ReferenceCheck,
    /// Close artifact received
    External,
    /// End of session
    Shutdown,
}

impl CloseReason {
    /// Record label
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ReferenceCheck => "reference_check",
            CloseReason::External => "external",
            CloseReason::Shutdown => "shutdown",
        }
    }
}

/// Summary of a fully closed position
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPosition {
    pub side: Side,
    pub width_ms: u64,
    pub open_time: TimeMs,
    pub close_time: TimeMs,
    pub open_price: Price,
    pub close_price: Price,
    pub lots: Decimal,
    /// Lot-weighted P/L in price points
    pub pnl_points: Decimal,
    pub reason: CloseReason,
}

/// How often the reference check runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CheckInterval {
    /// A quarter of the triggering window width
    QuarterWindow,
    /// A fixed interval
    Fixed { interval_ms: u64 },
}

impl CheckInterval {
    /// Interval for a window width
    pub fn interval_ms(&self, width_ms: u64) -> u64 {
        match self {
            CheckInterval::QuarterWindow => (width_ms / 4).max(1),
            CheckInterval::Fixed { interval_ms } => (*interval_ms).max(1),
        }
    }
}

/// What the reference price does after a passed check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// Move the reference to the current ask
    #[default]
    Ratchet,
    /// Keep the entry reference
    Fixed,
}
