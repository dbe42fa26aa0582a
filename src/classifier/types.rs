//! Classifier types

use crate::feature::{FeatureError, WindowFeatures};
use crate::signal::Side;
use thiserror::Error;

/// An actionable decision from one window
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    /// Side to open
    pub side: Side,
    /// Window width that produced the decision
    pub width_ms: u64,
    /// Strategy-specific description of the match
    pub provenance: String,
}

/// Why a window produced no decision
#[derive(Debug, Clone, PartialEq)]
pub enum PassReason {
    /// Feature missing or degenerate
    NoFeature(FeatureError),
    /// No training data for the window width
    Untrained,
    /// Fit quality below the configured minimum
    PoorFit(f64),
    /// Too few ticks for the window width
    Sparse,
    /// Query lies too far from its neighbourhood centroid
    OutsideRadius,
    /// Neither tally reached the threshold
    BelowThreshold { buy: i32, sell: i32 },
    /// No catalog entry matched
    NoMatch,
}

/// Outcome of evaluating one window
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Open a position
    Act(TradeIntent),
    /// Do nothing
    Pass(PassReason),
}

impl Verdict {
    /// Whether this verdict is actionable
    pub fn is_act(&self) -> bool {
        matches!(self, Verdict::Act(_))
    }
}

/// Turns window features into trade verdicts
pub trait FeatureStrategy: Send + Sync {
    /// Strategy name for logs and provenance
    fn name(&self) -> &'static str;

    /// Evaluate one window
    fn evaluate(&self, features: &WindowFeatures) -> Verdict;
}

/// Training data errors
#[derive(Debug, Error)]
pub enum TrainingError {
    /// File could not be opened or read
    #[error("Training data I/O error: {0}")]
    Csv(#[from] csv::Error),
    /// A row did not parse
    #[error("Malformed training row {line}: {reason}")]
    Malformed { line: usize, reason: String },
    /// A feature column has zero variance for a width
    #[error("Zero variance in {column} for {width_ms}ms training set")]
    ZeroVariance { width_ms: u64, column: &'static str },
    /// Fewer rows than neighbours requested
    #[error("{width_ms}ms training set has {rows} rows, need at least k={k}")]
    TooFewRows { width_ms: u64, rows: usize, k: usize },
    /// A configured window has no training set
    #[error("No training rows for configured {width_ms}ms window")]
    MissingWidth { width_ms: u64 },
}
