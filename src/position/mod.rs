//! Position and order state machine

mod book;
mod types;

pub use book::{ClosePolicy, Entry, PositionBook};
pub use types::{
    CheckInterval, CloseReason, ClosedPosition, Leg, Position, PositionState, ReferenceMode,
};
