//! Venue that publishes decisions as signal artifacts
//!
//! Used when decisions and execution run in separate processes. The first
//! leg of a position publishes one Open artifact; closing the last leg
//! publishes one Close artifact.

use super::{ExecutionError, OrderHandle, OrderRequest, OrderVenue};
use crate::feed::Price;
use crate::signal::{ArtifactKind, SignalArtifact, SignalChannel};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Order venue backed by a signal channel
pub struct SignalVenue {
    channel: Arc<dyn SignalChannel>,
    nominal_balance: Decimal,
    open: Mutex<HashSet<OrderHandle>>,
}

impl SignalVenue {
    /// Create a publishing venue
    ///
    /// `nominal_balance` is reported for sizing; the executor sizes for real.
    pub fn new(channel: Arc<dyn SignalChannel>, nominal_balance: Decimal) -> Self {
        Self {
            channel,
            nominal_balance,
            open: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl OrderVenue for SignalVenue {
    async fn submit_order(&self, order: OrderRequest) -> Result<OrderHandle, ExecutionError> {
        let mut open = self.open.lock().await;
        if open.is_empty() {
            self.channel.discard(ArtifactKind::Close).await?;
            let artifact = SignalArtifact::open(
                order.side,
                order.tick_time,
                order.loss_cut,
                order.provenance,
            );
            tracing::info!(id = %artifact.id, action = ?artifact.action, "Publishing open signal");
            self.channel.publish(artifact).await?;
        }
        let handle = OrderHandle::new_v4();
        open.insert(handle);
        Ok(handle)
    }

    async fn close_order(
        &self,
        handle: OrderHandle,
        _lots: Decimal,
        _price: Price,
    ) -> Result<(), ExecutionError> {
        let mut open = self.open.lock().await;
        if !open.remove(&handle) {
            return Err(ExecutionError::UnknownOrder(handle));
        }
        if open.is_empty() {
            let artifact = SignalArtifact::close(0, "position closed");
            tracing::info!(id = %artifact.id, "Publishing close signal");
            if let Err(e) = self.channel.publish(artifact).await {
                open.insert(handle);
                return Err(e.into());
            }
        }
        Ok(())
    }

    async fn account_balance(&self) -> Result<Decimal, ExecutionError> {
        Ok(self.nominal_balance)
    }
}
