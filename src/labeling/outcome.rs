//! Forward-looking trade outcome labels

use crate::feed::{Price, Tick, TimeMs};
use serde::{Deserialize, Serialize};

/// Outcome of a hypothetical buy and sell opened at one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLabel {
    pub time: TimeMs,
    pub ask: Price,
    pub bid: Price,
    /// First buy P/L whose magnitude reached the limit
    pub buy: Price,
    /// First sell P/L whose magnitude reached the limit
    pub sell: Price,
}

/// Label every tick with the first P/L that moves `pl_limit` points either way
///
/// A buy opened at `ask[i]` settles at `bid[j] − spread_delta`; a sell opened
/// at `bid[i]` settles at `ask[j] + spread_delta`. Scanning starts at the
/// opening tick itself. Ticks whose P/L never reaches the limit are labeled
/// `−pl_limit`.
pub fn label_outcomes(ticks: &[Tick], pl_limit: Price, spread_delta: Price) -> Vec<OutcomeLabel> {
    let pl_limit = pl_limit.abs();
    ticks
        .iter()
        .enumerate()
        .map(|(i, open)| OutcomeLabel {
            time: open.time,
            ask: open.ask,
            bid: open.bid,
            buy: first_hit(&ticks[i..], pl_limit, |settle| {
                settle.bid - spread_delta - open.ask
            }),
            sell: first_hit(&ticks[i..], pl_limit, |settle| {
                open.bid - settle.ask - spread_delta
            }),
        })
        .collect()
}

fn first_hit(ticks: &[Tick], pl_limit: Price, pl: impl Fn(&Tick) -> Price) -> Price {
    ticks
        .iter()
        .map(pl)
        .find(|pl| pl.abs() >= pl_limit)
        .unwrap_or(-pl_limit)
}
