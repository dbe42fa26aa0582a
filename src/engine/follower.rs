//! Execution side of a split deployment
//!
//! Consumes Open and Close artifacts published by a decision engine and
//! trades them through its own venue. The follower never decides on its
//! own; its position closes only on a Close artifact or at shutdown.

use super::{EngineError, TickHandler, TickOutcome, Trader};
use crate::feed::{Price, Tick};
use crate::position::{CloseReason, Entry};
use crate::signal::{ArtifactKind, SignalArtifact, SignalChannel};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Trades signal artifacts as they arrive
pub struct SignalFollower {
    channel: Arc<dyn SignalChannel>,
    trader: Trader,
    min_loss_cut: Price,
}

impl SignalFollower {
    /// Create a follower reading from `channel`
    pub fn new(channel: Arc<dyn SignalChannel>, trader: Trader, min_loss_cut: Price) -> Self {
        Self {
            channel,
            trader,
            min_loss_cut,
        }
    }

    /// Process one tick
    pub async fn on_tick(&mut self, tick: Tick) -> Result<TickOutcome, EngineError> {
        self.trader.summary_mut().ticks += 1;

        if self.trader.book().is_active() {
            if let Some(reason) = self.trader.book().pending_close() {
                return self.trader.close(&tick, reason).await;
            }
            return match self.take(ArtifactKind::Close).await {
                Some(_) => self.trader.close(&tick, CloseReason::External).await,
                None => Ok(TickOutcome::Holding),
            };
        }

        let Some(artifact) = self.take(ArtifactKind::Open).await else {
            return Ok(TickOutcome::Flat);
        };
        let Some(side) = artifact.action.side() else {
            tracing::warn!(id = %artifact.id, "Open slot held a non-open artifact");
            return Ok(TickOutcome::Flat);
        };
        self.trader.summary_mut().verdicts += 1;

        let entry = Entry {
            side,
            width_ms: 0,
            loss_cut: artifact.sizing_hint.max(self.min_loss_cut),
            provenance: artifact.provenance,
        };
        self.trader.open(&tick, entry).await
    }

    async fn take(&mut self, kind: ArtifactKind) -> Option<SignalArtifact> {
        match self.channel.take(kind, Utc::now()).await {
            Ok(Some(artifact)) => {
                tracing::info!(
                    id = %artifact.id,
                    action = ?artifact.action,
                    tick_time = artifact.tick_time,
                    "Signal received"
                );
                Some(artifact)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, ?kind, "Failed to read signal channel");
                None
            }
        }
    }
}

#[async_trait]
impl TickHandler for SignalFollower {
    async fn on_tick(&mut self, tick: Tick) -> Result<TickOutcome, EngineError> {
        SignalFollower::on_tick(self, tick).await
    }

    async fn shutdown(&mut self, last: &Tick) -> Result<(), EngineError> {
        self.trader.close(last, CloseReason::Shutdown).await?;
        Ok(())
    }

    fn trader(&mut self) -> &mut Trader {
        &mut self.trader
    }
}
