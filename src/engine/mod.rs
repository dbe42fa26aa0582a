//! Tick processing engines
//!
//! [`Engine`] turns ticks into trade decisions; [`SignalFollower`] executes
//! decisions published by another process. Both are driven the same way,
//! strictly one tick at a time.

mod decision;
mod follower;
mod strategy;
mod trader;
mod types;

pub use decision::Engine;
pub use follower::SignalFollower;
pub use strategy::build_strategy;
pub use trader::Trader;
pub use types::{EngineError, SessionSummary, TickOutcome};

use crate::feed::{Tick, TickSource};
use async_trait::async_trait;

/// Something that consumes ticks in order
#[async_trait]
pub trait TickHandler: Send {
    /// Process one tick to completion
    async fn on_tick(&mut self, tick: Tick) -> Result<TickOutcome, EngineError>;

    /// Called with the last tick once the feed ends
    async fn shutdown(&mut self, last: &Tick) -> Result<(), EngineError>;

    /// Position lifecycle and session counters
    fn trader(&mut self) -> &mut Trader;

    /// Drain `feed`, then close any open position and flush records
    async fn run(&mut self, feed: &dyn TickSource) -> anyhow::Result<SessionSummary> {
        let mut rx = feed.subscribe().await?;
        let mut last = None;

        while let Some(tick) = rx.recv().await {
            let outcome = self.on_tick(tick).await?;
            tracing::trace!(time = tick.time, outcome = outcome.as_str(), "Tick processed");
            last = Some(tick);
        }

        if let Some(tick) = last {
            self.shutdown(&tick).await?;
        }
        let trader = self.trader();
        trader.flush()?;
        tracing::info!(
            ticks = trader.summary().ticks,
            opens = trader.summary().opens,
            closes = trader.summary().closes,
            pnl_points = %trader.summary().pnl_points,
            "Feed finished"
        );
        Ok(trader.summary().clone())
    }
}
