//! Position lifecycle: open, periodic close check, close

use super::{
    CheckInterval, CloseReason, ClosedPosition, Leg, Position, PositionState, ReferenceMode,
};
use crate::execution::{ExecutionError, OrderRequest, OrderVenue};
use crate::feed::{Price, Tick, TimeMs};
use crate::risk::LotPlan;
use crate::signal::Side;
use rust_decimal::Decimal;

/// When an open position should be closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePolicy {
    pub interval: CheckInterval,
    pub reference: ReferenceMode,
    /// Required favourable move per check, in price points
    pub min_profit: Price,
}

/// What to open
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub side: Side,
    pub width_ms: u64,
    /// Stop-loss distance from the closing-side price
    pub loss_cut: Price,
    pub provenance: String,
}

/// Owns the single position and drives it through the venue
#[derive(Debug, Default)]
pub struct PositionBook {
    state: PositionState,
    policy: Option<ClosePolicy>,
    pending_close: Option<CloseReason>,
}

impl PositionBook {
    /// Create an idle book; `None` disables the periodic close check
    pub fn new(policy: Option<ClosePolicy>) -> Self {
        Self {
            state: PositionState::Idle,
            policy,
            pending_close: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &PositionState {
        &self.state
    }

    /// Whether a position is open
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Close that failed part-way and must be retried
    pub fn pending_close(&self) -> Option<CloseReason> {
        self.pending_close
    }

    /// Open a position with one order per planned leg
    ///
    /// Legs that fail are skipped. If every leg fails the book stays idle
    /// and the last venue error is returned.
    pub async fn open(
        &mut self,
        entry: Entry,
        tick: &Tick,
        plan: &LotPlan,
        venue: &dyn OrderVenue,
    ) -> Result<Position, ExecutionError> {
        if self.state.is_active() {
            return Err(ExecutionError::PositionActive);
        }
        let (open_price, stop_loss) = match entry.side {
            Side::Buy => (tick.ask, tick.bid - entry.loss_cut),
            Side::Sell => (tick.bid, tick.ask + entry.loss_cut),
        };

        let mut legs = Vec::with_capacity(plan.legs.len());
        let mut last_error = None;
        for lots in &plan.legs {
            let request = OrderRequest {
                side: entry.side,
                lots: *lots,
                price: open_price,
                stop_loss,
                loss_cut: entry.loss_cut,
                tick_time: tick.time,
                provenance: entry.provenance.clone(),
            };
            match venue.submit_order(request).await {
                Ok(handle) => legs.push(Leg {
                    handle,
                    lots: *lots,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, lots = %lots, "Leg submission failed");
                    last_error = Some(e);
                }
            }
        }
        if legs.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| ExecutionError::Rejected("no legs planned".into())));
        }

        let next_check_at = self.policy.map_or(TimeMs::MAX, |policy| {
            tick.time + policy.interval.interval_ms(entry.width_ms)
        });
        let position = Position {
            side: entry.side,
            open_time: tick.time,
            open_price,
            reference_price: tick.ask,
            width_ms: entry.width_ms,
            opened_lots: legs.iter().map(|leg| leg.lots).sum(),
            legs,
            checks_done: 0,
            next_check_at,
            realized_points: Decimal::ZERO,
            provenance: entry.provenance,
        };
        self.state = PositionState::Active(position.clone());
        Ok(position)
    }

    /// Run the periodic reference check; returns true when the position should close
    ///
    /// A buy closes when the ask has not risen more than `min_profit` above
    /// the reference, a sell when it has not fallen more than `min_profit`
    /// below it. Otherwise the check counter advances and the next check is
    /// due one interval after this tick.
    pub fn evaluate_close(&mut self, tick: &Tick) -> bool {
        let (PositionState::Active(position), Some(policy)) = (&mut self.state, &self.policy)
        else {
            return false;
        };
        if tick.time < position.next_check_at {
            return false;
        }

        let stalled = match position.side {
            Side::Buy => tick.ask <= position.reference_price + policy.min_profit,
            Side::Sell => tick.ask >= position.reference_price - policy.min_profit,
        };
        if stalled {
            return true;
        }

        position.checks_done += 1;
        position.next_check_at = tick.time + policy.interval.interval_ms(position.width_ms);
        if policy.reference == ReferenceMode::Ratchet {
            position.reference_price = tick.ask;
        }
        tracing::debug!(
            checks_done = position.checks_done,
            reference = position.reference_price,
            "Position check passed"
        );
        false
    }

    /// Close every open leg at the tick's closing-side price
    ///
    /// Idle books return `Ok(None)`. Legs that fail to close stay open, the
    /// book stays active and the close is remembered for retry.
    pub async fn close_all(
        &mut self,
        tick: &Tick,
        reason: CloseReason,
        venue: &dyn OrderVenue,
    ) -> Result<Option<ClosedPosition>, ExecutionError> {
        let PositionState::Active(position) = &mut self.state else {
            return Ok(None);
        };
        let close_price = position.close_price(tick);
        let points = Decimal::from(position.points_at(close_price));

        let mut remaining = Vec::new();
        for leg in std::mem::take(&mut position.legs) {
            match venue.close_order(leg.handle, leg.lots, close_price).await {
                Ok(()) => position.realized_points += points * leg.lots,
                Err(e) => {
                    tracing::warn!(handle = %leg.handle, error = %e, "Leg close failed");
                    remaining.push(leg);
                }
            }
        }

        if !remaining.is_empty() {
            let count = remaining.len();
            position.legs = remaining;
            self.pending_close = Some(self.pending_close.unwrap_or(reason));
            return Err(ExecutionError::PartialClose { remaining: count });
        }

        let reason = self.pending_close.take().unwrap_or(reason);
        let closed = ClosedPosition {
            side: position.side,
            width_ms: position.width_ms,
            open_time: position.open_time,
            close_time: tick.time,
            open_price: position.open_price,
            close_price,
            lots: position.opened_lots,
            pnl_points: position.realized_points,
            reason,
        };
        self.state = PositionState::Idle;
        Ok(Some(closed))
    }
}
