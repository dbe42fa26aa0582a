//! Signal types

use crate::feed::TimeMs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Trading side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Long the instrument
    Buy,
    /// Short the instrument
    Sell,
}

impl Side {
    /// Metric/record label
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of artifact carried by the signal channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Instruction to open a position
    Open,
    /// Instruction to close the current position
    Close,
}

impl ArtifactKind {
    /// File stem used by file-backed channels
    pub fn file_stem(&self) -> &'static str {
        match self {
            ArtifactKind::Open => "signal",
            ArtifactKind::Close => "signal_close",
        }
    }
}

/// Action requested by an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    /// Open a long position
    OpenBuy,
    /// Open a short position
    OpenSell,
    /// Close whatever is open
    Close,
}

impl SignalAction {
    /// Open action for a side
    pub fn open(side: Side) -> Self {
        match side {
            Side::Buy => SignalAction::OpenBuy,
            Side::Sell => SignalAction::OpenSell,
        }
    }

    /// Side to open, if this is an open action
    pub fn side(&self) -> Option<Side> {
        match self {
            SignalAction::OpenBuy => Some(Side::Buy),
            SignalAction::OpenSell => Some(Side::Sell),
            SignalAction::Close => None,
        }
    }

    /// Channel slot this action travels in
    pub fn kind(&self) -> ArtifactKind {
        match self {
            SignalAction::Close => ArtifactKind::Close,
            _ => ArtifactKind::Open,
        }
    }
}

/// A write-once, read-once instruction passed between processes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalArtifact {
    /// Unique artifact identifier
    pub id: Uuid,
    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,
    /// Tick time the decision was made at
    pub tick_time: TimeMs,
    /// Requested action
    pub action: SignalAction,
    /// Loss-cut width in price points
    pub sizing_hint: i64,
    /// What produced the decision
    pub provenance: String,
}

impl SignalArtifact {
    /// Create an open artifact
    pub fn open(side: Side, tick_time: TimeMs, loss_cut: i64, provenance: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            tick_time,
            action: SignalAction::open(side),
            sizing_hint: loss_cut,
            provenance: provenance.into(),
        }
    }

    /// Create a close artifact
    pub fn close(tick_time: TimeMs, provenance: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            tick_time,
            action: SignalAction::Close,
            sizing_hint: 0,
            provenance: provenance.into(),
        }
    }

    /// Channel slot of this artifact
    pub fn kind(&self) -> ArtifactKind {
        self.action.kind()
    }

    /// Whether the artifact is older than `max_age` at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.created_at > max_age
    }
}
