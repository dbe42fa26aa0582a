//! Tick feed module
//!
//! Tick sources deliver quotes over a channel, one at a time, in time order.

mod replay;
mod types;

pub use replay::{read_ticks, ReplayFeed};
pub use types::{Price, Tick, TimeMs};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for tick sources (live venue feeds or recorded replays)
#[async_trait]
pub trait TickSource: Send + Sync {
    /// Subscribe to ticks
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<Tick>>;
}
