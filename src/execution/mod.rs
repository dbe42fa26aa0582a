//! Order venues
//!
//! Handles order submission against a paper account or by publishing
//! signal artifacts for a separate execution process

mod paper;
mod publish;
mod types;

pub use paper::PaperVenue;
pub use publish::SignalVenue;
pub use types::{ExecutionError, Fill, OrderHandle, OrderRequest};

use crate::feed::Price;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for order venue implementations
#[async_trait]
pub trait OrderVenue: Send + Sync {
    /// Submit an order for one leg
    async fn submit_order(&self, order: OrderRequest) -> Result<OrderHandle, ExecutionError>;
    /// Close `lots` of an open leg at `price`
    async fn close_order(
        &self,
        handle: OrderHandle,
        lots: Decimal,
        price: Price,
    ) -> Result<(), ExecutionError>;
    /// Current account balance
    async fn account_balance(&self) -> Result<Decimal, ExecutionError>;
}
