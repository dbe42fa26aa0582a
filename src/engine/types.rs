//! Engine types

use crate::classifier::TrainingError;
use crate::execution::ExecutionError;
use crate::position::{ClosedPosition, Position};
use crate::risk::{GateRejection, RiskError};
use rust_decimal::Decimal;
use thiserror::Error;

/// What a tick did to the engine
#[derive(Debug)]
pub enum TickOutcome {
    /// Idle and nothing actionable
    Flat,
    /// A verdict was refused by an open gate
    Rejected(GateRejection),
    /// A verdict could not be sized
    Unsized(RiskError),
    /// A position was opened
    Opened(Position),
    /// Opening failed; still idle
    OpenFailed(ExecutionError),
    /// A position is open and stays open
    Holding,
    /// The position was closed
    Closed(ClosedPosition),
    /// Closing failed for some legs; retried next tick
    CloseFailed(ExecutionError),
}

impl TickOutcome {
    /// Short label for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TickOutcome::Flat => "flat",
            TickOutcome::Rejected(_) => "rejected",
            TickOutcome::Unsized(_) => "unsized",
            TickOutcome::Opened(_) => "opened",
            TickOutcome::OpenFailed(_) => "open_failed",
            TickOutcome::Holding => "holding",
            TickOutcome::Closed(_) => "closed",
            TickOutcome::CloseFailed(_) => "close_failed",
        }
    }
}

/// Engine errors that stop processing
#[derive(Debug, Error)]
pub enum EngineError {
    /// Training data could not be loaded
    #[error("Training data error: {0}")]
    Training(#[from] TrainingError),
    /// Record sink failed
    #[error("Recorder error: {0}")]
    Record(#[from] csv::Error),
}

/// Counters for one replay or live session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub ticks: u64,
    pub verdicts: u64,
    pub rejections: u64,
    pub opens: u64,
    pub closes: u64,
    pub failures: u64,
    /// Realized P/L in price points × lots
    pub pnl_points: Decimal,
}

impl SessionSummary {
    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        format!(
            r#"
══════════════════════════════════════════════════════
               SESSION SUMMARY
══════════════════════════════════════════════════════
Ticks processed:  {}
Verdicts:         {}
Gate rejections:  {}
Opens:            {}
Closes:           {}
Failures:         {}
Total P/L points: {:+}
══════════════════════════════════════════════════════
"#,
            self.ticks,
            self.verdicts,
            self.rejections,
            self.opens,
            self.closes,
            self.failures,
            self.pnl_points,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_table() {
        let summary = SessionSummary {
            ticks: 120,
            opens: 2,
            closes: 2,
            pnl_points: dec!(-15),
            ..Default::default()
        };
        let table = summary.format_table();
        assert!(table.contains("Ticks processed:  120"));
        assert!(table.contains("Total P/L points: -15"));
    }
}
