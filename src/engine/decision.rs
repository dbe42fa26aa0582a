//! Decision engine
//!
//! Owns the tick history and all per-session state. Each tick is appended
//! to the history, features are extracted for every window and either the
//! open position is managed or the strategy is asked for an entry.

use super::{EngineError, TickHandler, TickOutcome, Trader};
use crate::classifier::{FeatureStrategy, Verdict};
use crate::config::Config;
use crate::data::TickRecord;
use crate::feature::{FeatureExtractor, WindowFeatures};
use crate::feed::{Price, Tick};
use crate::history::RingBuffer;
use crate::position::{CloseReason, Entry};
use crate::risk::{Cooldown, MovementGate, OpenGates};
use crate::signal::{ArtifactKind, SignalChannel};
use crate::telemetry::{self, CounterMetric};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Tick-driven decision engine
pub struct Engine {
    ring: RingBuffer,
    extractor: FeatureExtractor,
    strategy: Box<dyn FeatureStrategy>,
    gates: OpenGates,
    trader: Trader,
    inbox: Option<Arc<dyn SignalChannel>>,
    loss_cut: Price,
}

impl Engine {
    /// Create an engine from configuration
    pub fn new(config: &Config, strategy: Box<dyn FeatureStrategy>, trader: Trader) -> Self {
        let gates = OpenGates {
            max_spread: config.gates.max_spread,
            movement: MovementGate::new(
                config.gates.movement_window_ms,
                config.gates.movement_threshold,
                config.gates.movement_wait_ms,
                config.instrument.normalize_to,
            ),
            cooldown: Cooldown::new(config.gates.wait_time_ms),
        };
        Self {
            ring: RingBuffer::new(config.history.capacity),
            extractor: FeatureExtractor::new(
                &config.windows,
                config.features.incomplete,
                config.instrument.normalize_to,
            ),
            strategy,
            gates,
            trader,
            inbox: None,
            loss_cut: config.close.loss_cut,
        }
    }

    /// Consume Close artifacts from `channel` while a position is open
    pub fn with_inbox(mut self, channel: Arc<dyn SignalChannel>) -> Self {
        self.inbox = Some(channel);
        self
    }

    /// Tick history
    pub fn history(&self) -> &RingBuffer {
        &self.ring
    }

    /// Open gates
    pub fn gates(&self) -> &OpenGates {
        &self.gates
    }

    /// Process one tick
    pub async fn on_tick(&mut self, tick: Tick) -> Result<TickOutcome, EngineError> {
        let started = Instant::now();
        telemetry::increment(CounterMetric::Ticks);
        self.trader.summary_mut().ticks += 1;

        let index = self.ring.append(tick.time, tick.ask);
        let movement = self.gates.observe(&tick);
        let features = self.extractor.extract(&self.ring, index);
        self.trader
            .record_tick(&TickRecord::new(&tick, &features, movement))?;

        let outcome = if self.trader.book().is_active() {
            self.manage(&tick).await?
        } else {
            self.seek_entry(&tick, &features).await?
        };

        telemetry::record_tick_latency(started.elapsed());
        Ok(outcome)
    }

    /// Close the open position, if any
    pub async fn close_position(
        &mut self,
        tick: &Tick,
        reason: CloseReason,
    ) -> Result<TickOutcome, EngineError> {
        self.trader.close(tick, reason).await
    }

    async fn manage(&mut self, tick: &Tick) -> Result<TickOutcome, EngineError> {
        let reason = if let Some(pending) = self.trader.book().pending_close() {
            Some(pending)
        } else if self.take_external_close().await {
            Some(CloseReason::External)
        } else if self.trader.book_mut().evaluate_close(tick) {
            Some(CloseReason::ReferenceCheck)
        } else {
            None
        };

        match reason {
            Some(reason) => self.trader.close(tick, reason).await,
            None => Ok(TickOutcome::Holding),
        }
    }

    async fn take_external_close(&mut self) -> bool {
        let Some(inbox) = &self.inbox else {
            return false;
        };
        match inbox.take(ArtifactKind::Close, Utc::now()).await {
            Ok(Some(artifact)) => {
                tracing::info!(id = %artifact.id, provenance = %artifact.provenance, "External close received");
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read signal inbox");
                false
            }
        }
    }

    async fn seek_entry(
        &mut self,
        tick: &Tick,
        features: &[WindowFeatures],
    ) -> Result<TickOutcome, EngineError> {
        let mut intent = None;
        for window in features {
            match self.strategy.evaluate(window) {
                Verdict::Act(found) => {
                    intent = Some(found);
                    break;
                }
                Verdict::Pass(reason) => {
                    tracing::debug!(
                        width_ms = window.spec.width_ms,
                        strategy = self.strategy.name(),
                        ?reason,
                        "Window passed"
                    );
                }
            }
        }
        let Some(intent) = intent else {
            return Ok(TickOutcome::Flat);
        };

        tracing::debug!(
            time = tick.time,
            side = %intent.side,
            width_ms = intent.width_ms,
            provenance = %intent.provenance,
            "Actionable verdict"
        );
        telemetry::record_verdict(intent.side.as_str());
        self.trader.summary_mut().verdicts += 1;

        if let Err(rejection) = self.gates.check(tick) {
            tracing::warn!(time = tick.time, side = %intent.side, %rejection, "Open rejected by gate");
            telemetry::record_gate_rejection(rejection.gate());
            self.trader.summary_mut().rejections += 1;
            return Ok(TickOutcome::Rejected(rejection));
        }

        let entry = Entry {
            side: intent.side,
            width_ms: intent.width_ms,
            loss_cut: self.loss_cut,
            provenance: intent.provenance,
        };
        let outcome = self.trader.open(tick, entry).await?;
        if matches!(outcome, TickOutcome::Opened(_)) {
            self.gates.cooldown.record_open(tick.time);
        }
        Ok(outcome)
    }
}

#[async_trait]
impl TickHandler for Engine {
    async fn on_tick(&mut self, tick: Tick) -> Result<TickOutcome, EngineError> {
        Engine::on_tick(self, tick).await
    }

    async fn shutdown(&mut self, last: &Tick) -> Result<(), EngineError> {
        self.close_position(last, CloseReason::Shutdown).await?;
        Ok(())
    }

    fn trader(&mut self) -> &mut Trader {
        &mut self.trader
    }
}
