//! Execution types

use crate::feed::{Price, TimeMs};
use crate::signal::{ChannelError, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Venue-issued order handle
pub type OrderHandle = Uuid;

/// An order to open one leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Trade side
    pub side: Side,
    /// Lots for this leg
    pub lots: Decimal,
    /// Fixed-point entry price
    pub price: Price,
    /// Fixed-point stop-loss price
    pub stop_loss: Price,
    /// Stop-loss distance in price points
    pub loss_cut: Price,
    /// Tick time of the decision
    pub tick_time: TimeMs,
    /// What produced the decision
    pub provenance: String,
}

/// An executed open or close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Order handle
    pub handle: OrderHandle,
    /// Side of the position
    pub side: Side,
    /// Fixed-point fill price
    pub price: Price,
    /// Lots filled
    pub lots: Decimal,
    /// Whether this fill closed the leg
    pub closing: bool,
    /// Realized P/L in account currency (closing fills only)
    pub realized: Decimal,
    /// Fill timestamp
    pub timestamp: DateTime<Utc>,
}

/// Venue failures
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Venue refused the order
    #[error("Order rejected: {0}")]
    Rejected(String),
    /// Handle not known to the venue
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderHandle),
    /// A position is already open
    #[error("Position already active")]
    PositionActive,
    /// Some legs could not be closed and remain open
    #[error("{remaining} leg(s) failed to close")]
    PartialClose { remaining: usize },
    /// Signal channel failure
    #[error("Signal channel error: {0}")]
    Channel(#[from] ChannelError),
}
