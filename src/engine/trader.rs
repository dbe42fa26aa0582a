//! Opening and closing positions against a venue
//!
//! Shared by the decision engine and the signal follower: sizing, the
//! position book, order records, metrics and the session counters.

use super::{EngineError, SessionSummary, TickOutcome};
use crate::data::{OrderEvent, OrderRecord, Recorder, TickRecord};
use crate::execution::OrderVenue;
use crate::feed::Tick;
use crate::position::{CloseReason, Entry, PositionBook};
use crate::risk::LotSizer;
use crate::telemetry::{self, CounterMetric};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Position lifecycle against one venue
pub struct Trader {
    book: PositionBook,
    sizer: LotSizer,
    venue: Arc<dyn OrderVenue>,
    recorder: Option<Box<dyn Recorder>>,
    price_scale: i64,
    summary: SessionSummary,
}

impl Trader {
    /// Create a trader
    pub fn new(
        book: PositionBook,
        sizer: LotSizer,
        venue: Arc<dyn OrderVenue>,
        price_scale: i64,
    ) -> Self {
        Self {
            book,
            sizer,
            venue,
            recorder: None,
            price_scale: price_scale.max(1),
            summary: SessionSummary::default(),
        }
    }

    /// Attach a record sink
    pub fn with_recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub(crate) fn book_mut(&mut self) -> &mut PositionBook {
        &mut self.book
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub(crate) fn summary_mut(&mut self) -> &mut SessionSummary {
        &mut self.summary
    }

    /// Write a tick record if a recorder is attached
    pub fn record_tick(&mut self, record: &TickRecord) -> Result<(), EngineError> {
        if let Some(recorder) = &mut self.recorder {
            recorder.record_tick(record)?;
        }
        Ok(())
    }

    fn record_order(&mut self, record: OrderRecord) -> Result<(), EngineError> {
        telemetry::record_order(record.event.as_str());
        if let Some(recorder) = &mut self.recorder {
            recorder.record_order(&record)?;
        }
        Ok(())
    }

    /// Size and open a position
    ///
    /// Sizing and venue failures are logged and reported in the outcome;
    /// the book stays idle.
    pub async fn open(&mut self, tick: &Tick, entry: Entry) -> Result<TickOutcome, EngineError> {
        let balance = match self.venue.account_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read account balance");
                telemetry::increment(CounterMetric::ExecutionFailures);
                self.summary.failures += 1;
                return Ok(TickOutcome::OpenFailed(e));
            }
        };

        let price = Decimal::from(tick.ask) / Decimal::from(self.price_scale);
        let plan = match self.sizer.plan(balance, price) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot size position");
                return Ok(TickOutcome::Unsized(e));
            }
        };

        let (side, width_ms) = (entry.side, entry.width_ms);
        match self.book.open(entry, tick, &plan, self.venue.as_ref()).await {
            Ok(position) => {
                tracing::info!(
                    time = tick.time,
                    side = %position.side,
                    width_ms = position.width_ms,
                    price = position.open_price,
                    lots = %position.opened_lots,
                    legs = position.legs.len(),
                    provenance = %position.provenance,
                    "Position opened"
                );
                telemetry::set_position_active(true);
                self.summary.opens += 1;
                self.record_order(OrderRecord {
                    time: tick.time,
                    event: OrderEvent::Open,
                    side: position.side,
                    width_ms: position.width_ms,
                    price: position.open_price,
                    lots: position.opened_lots,
                    pnl_points: Decimal::ZERO,
                    detail: position.provenance.clone(),
                })?;
                Ok(TickOutcome::Opened(position))
            }
            Err(e) => {
                tracing::error!(time = tick.time, side = %side, error = %e, "Failed to open position");
                telemetry::increment(CounterMetric::ExecutionFailures);
                self.summary.failures += 1;
                self.record_order(OrderRecord {
                    time: tick.time,
                    event: OrderEvent::OpenFailed,
                    side,
                    width_ms,
                    price: tick.ask,
                    lots: plan.total,
                    pnl_points: Decimal::ZERO,
                    detail: e.to_string(),
                })?;
                Ok(TickOutcome::OpenFailed(e))
            }
        }
    }

    /// Close the open position
    ///
    /// Returns [`TickOutcome::Flat`] without side effects when idle, so a
    /// repeated close is harmless.
    pub async fn close(
        &mut self,
        tick: &Tick,
        reason: CloseReason,
    ) -> Result<TickOutcome, EngineError> {
        let Some(position) = self.book.state().position().cloned() else {
            tracing::debug!(time = tick.time, reason = reason.as_str(), "Close ignored, no position");
            return Ok(TickOutcome::Flat);
        };

        match self.book.close_all(tick, reason, self.venue.as_ref()).await {
            Ok(Some(closed)) => {
                tracing::info!(
                    time = tick.time,
                    side = %closed.side,
                    price = closed.close_price,
                    pnl_points = %closed.pnl_points,
                    held_ms = closed.close_time.saturating_sub(closed.open_time),
                    reason = closed.reason.as_str(),
                    "Position closed"
                );
                telemetry::set_position_active(false);
                self.summary.closes += 1;
                self.summary.pnl_points += closed.pnl_points;
                self.record_order(OrderRecord::closed(&closed))?;
                Ok(TickOutcome::Closed(closed))
            }
            Ok(None) => Ok(TickOutcome::Flat),
            Err(e) => {
                tracing::error!(time = tick.time, error = %e, "Failed to close position, retrying next tick");
                telemetry::increment(CounterMetric::ExecutionFailures);
                self.summary.failures += 1;
                self.record_order(OrderRecord {
                    time: tick.time,
                    event: OrderEvent::CloseFailed,
                    side: position.side,
                    width_ms: position.width_ms,
                    price: position.close_price(tick),
                    lots: self
                        .book
                        .state()
                        .position()
                        .map_or(Decimal::ZERO, |p| p.open_lots()),
                    pnl_points: Decimal::ZERO,
                    detail: e.to_string(),
                })?;
                Ok(TickOutcome::CloseFailed(e))
            }
        }
    }

    /// Flush the recorder
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if let Some(recorder) = &mut self.recorder {
            recorder.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryRecorder;
    use crate::execution::PaperVenue;
    use crate::signal::Side;
    use rust_decimal_macros::dec;

    fn sizer() -> LotSizer {
        LotSizer {
            leverage: dec!(25),
            margin_usage: dec!(0.92),
            contract_size: dec!(1000),
            lot_step: dec!(0.1),
            max_lots_per_position: dec!(10),
            max_lots_per_account: dec!(100),
            max_legs: 100,
        }
    }

    fn entry() -> Entry {
        Entry {
            side: Side::Buy,
            width_ms: 2000,
            loss_cut: 50,
            provenance: "test".into(),
        }
    }

    #[tokio::test]
    async fn test_open_then_close_records_orders() {
        let venue = PaperVenue::new(dec!(100000), 1000, dec!(1000));
        let recorder = MemoryRecorder::new();
        let mut trader = Trader::new(PositionBook::new(None), sizer(), Arc::new(venue), 1000)
            .with_recorder(Box::new(recorder.clone()));

        let outcome = trader.open(&Tick::new(0, 110_000, 109_990), entry()).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Opened(_)));

        let outcome = trader
            .close(&Tick::new(500, 110_030, 110_020), CloseReason::External)
            .await
            .unwrap();
        let TickOutcome::Closed(closed) = outcome else {
            panic!("expected close, got {:?}", outcome);
        };
        // bid 110020 - ask 110000 on 20.7 lots
        assert_eq!(closed.pnl_points, dec!(20) * dec!(20.7));

        let events: Vec<_> = recorder.orders().iter().map(|o| o.event).collect();
        assert_eq!(events, vec![OrderEvent::Open, OrderEvent::Close]);
        assert_eq!(trader.summary().opens, 1);
        assert_eq!(trader.summary().closes, 1);
    }

    #[tokio::test]
    async fn test_close_when_idle_is_noop() {
        let venue = PaperVenue::new(dec!(100000), 1000, dec!(1000));
        let recorder = MemoryRecorder::new();
        let mut trader = Trader::new(PositionBook::new(None), sizer(), Arc::new(venue), 1000)
            .with_recorder(Box::new(recorder.clone()));

        let outcome = trader
            .close(&Tick::new(0, 110_000, 109_990), CloseReason::Shutdown)
            .await
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Flat));
        assert!(recorder.orders().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_balance_stays_idle() {
        let venue = PaperVenue::new(dec!(1), 1000, dec!(1000));
        let mut trader = Trader::new(PositionBook::new(None), sizer(), Arc::new(venue), 1000);

        let outcome = trader.open(&Tick::new(0, 110_000, 109_990), entry()).await.unwrap();
        assert!(matches!(outcome, TickOutcome::Unsized(_)));
        assert!(!trader.book().is_active());
    }

    #[tokio::test]
    async fn test_failed_open_is_counted() {
        let venue = PaperVenue::new(dec!(100000), 1000, dec!(1000));
        venue.fail_next_submits(10).await;
        let mut trader = Trader::new(PositionBook::new(None), sizer(), Arc::new(venue), 1000);

        let outcome = trader.open(&Tick::new(0, 110_000, 109_990), entry()).await.unwrap();
        assert!(matches!(outcome, TickOutcome::OpenFailed(_)));
        assert_eq!(trader.summary().failures, 1);
        assert!(!trader.book().is_active());
    }
}
