//! Risk control types

use crate::feed::{Price, TimeMs};
use rust_decimal::Decimal;
use thiserror::Error;

/// Why an open decision was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateRejection {
    /// Quoted spread wider than allowed
    #[error("Spread too wide: {spread} > {max}")]
    Spread { spread: Price, max: Price },
    /// Recent price movement breached the threshold
    #[error("Movement breach at {breached_at}, blocked until {until}")]
    Movement { breached_at: TimeMs, until: TimeMs },
    /// Too soon after the previous open
    #[error("Cooldown active until {until}")]
    Cooldown { until: TimeMs },
}

impl GateRejection {
    /// Metric label
    pub fn gate(&self) -> &'static str {
        match self {
            GateRejection::Spread { .. } => "spread",
            GateRejection::Movement { .. } => "movement",
            GateRejection::Cooldown { .. } => "cooldown",
        }
    }
}

/// Sizing errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Balance too small for a single lot step
    #[error("Insufficient balance {balance} for price {price}")]
    InsufficientBalance { balance: Decimal, price: Decimal },
    /// Price is not positive
    #[error("Invalid price for sizing: {0}")]
    InvalidPrice(Decimal),
}
