//! Risk controls
//!
//! Open gates and lot sizing

mod gates;
mod sizing;
mod types;

pub use gates::{Cooldown, MovementGate, OpenGates};
pub use sizing::{LotPlan, LotSizer};
pub use types::{GateRejection, RiskError};
