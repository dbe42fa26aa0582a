//! Paper trading venue with simulated fills

use super::{ExecutionError, Fill, OrderHandle, OrderRequest, OrderVenue};
use crate::feed::Price;
use crate::signal::Side;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct OpenLeg {
    side: Side,
    lots: Decimal,
    price: Price,
}

#[derive(Debug, Default)]
struct PaperState {
    balance: Decimal,
    open: HashMap<OrderHandle, OpenLeg>,
    fills: Vec<Fill>,
    fail_submits: usize,
    fail_closes: usize,
}

/// Paper venue: fills immediately at the requested price
///
/// Realized P/L is `points / price_scale · lots · contract_size` in account
/// currency.
#[derive(Clone)]
pub struct PaperVenue {
    price_scale: Decimal,
    contract_size: Decimal,
    state: Arc<RwLock<PaperState>>,
}

impl PaperVenue {
    /// Create a paper venue with a starting balance
    pub fn new(initial_balance: Decimal, price_scale: i64, contract_size: Decimal) -> Self {
        Self {
            price_scale: Decimal::from(price_scale.max(1)),
            contract_size,
            state: Arc::new(RwLock::new(PaperState {
                balance: initial_balance,
                ..Default::default()
            })),
        }
    }

    /// Reject the next `n` submissions
    pub async fn fail_next_submits(&self, n: usize) {
        self.state.write().await.fail_submits = n;
    }

    /// Reject the next `n` closes
    pub async fn fail_next_closes(&self, n: usize) {
        self.state.write().await.fail_closes = n;
    }

    /// All fills so far
    pub async fn fills(&self) -> Vec<Fill> {
        self.state.read().await.fills.clone()
    }

    /// Number of legs currently open
    pub async fn open_legs(&self) -> usize {
        self.state.read().await.open.len()
    }
}

#[async_trait]
impl OrderVenue for PaperVenue {
    async fn submit_order(&self, order: OrderRequest) -> Result<OrderHandle, ExecutionError> {
        let mut state = self.state.write().await;
        if state.fail_submits > 0 {
            state.fail_submits -= 1;
            return Err(ExecutionError::Rejected("simulated submit failure".into()));
        }

        let handle = OrderHandle::new_v4();
        state.open.insert(
            handle,
            OpenLeg {
                side: order.side,
                lots: order.lots,
                price: order.price,
            },
        );
        state.fills.push(Fill {
            handle,
            side: order.side,
            price: order.price,
            lots: order.lots,
            closing: false,
            realized: Decimal::ZERO,
            timestamp: Utc::now(),
        });

        tracing::debug!(%handle, side = %order.side, lots = %order.lots, price = order.price, "Paper order filled");
        Ok(handle)
    }

    async fn close_order(
        &self,
        handle: OrderHandle,
        lots: Decimal,
        price: Price,
    ) -> Result<(), ExecutionError> {
        let mut state = self.state.write().await;
        if state.fail_closes > 0 {
            state.fail_closes -= 1;
            return Err(ExecutionError::Rejected("simulated close failure".into()));
        }
        let leg = state
            .open
            .remove(&handle)
            .ok_or(ExecutionError::UnknownOrder(handle))?;

        let points = match leg.side {
            Side::Buy => price - leg.price,
            Side::Sell => leg.price - price,
        };
        let closed = lots.min(leg.lots);
        let realized = Decimal::from(points) / self.price_scale * closed * self.contract_size;
        state.balance += realized;
        state.fills.push(Fill {
            handle,
            side: leg.side,
            price,
            lots: closed,
            closing: true,
            realized,
            timestamp: Utc::now(),
        });
        if closed < leg.lots {
            state.open.insert(
                handle,
                OpenLeg {
                    lots: leg.lots - closed,
                    ..leg
                },
            );
        }

        tracing::debug!(%handle, points, %realized, "Paper order closed");
        Ok(())
    }

    async fn account_balance(&self) -> Result<Decimal, ExecutionError> {
        Ok(self.state.read().await.balance)
    }
}
