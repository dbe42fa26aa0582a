//! Open gating: spread, recent movement and re-entry cooldown
//!
//! Gates only refuse new positions. They never interfere with closing one.

use super::GateRejection;
use crate::feed::{Price, Tick, TimeMs};
use std::collections::VecDeque;

/// Rolling sum of absolute ask changes over a time window
///
/// The sum is normalized by `ask / normalize_to`, like window prices, so a
/// single threshold works across price levels.
#[derive(Debug, Clone)]
pub struct MovementGate {
    window_ms: u64,
    threshold: f64,
    wait_ms: u64,
    normalize_to: Price,
    /// (time of the earlier tick, |Δask| to the next one)
    steps: VecDeque<(TimeMs, Price)>,
    total: Price,
    last: Option<(TimeMs, Price)>,
    last_breach: Option<TimeMs>,
}

impl MovementGate {
    /// Create a movement gate
    pub fn new(window_ms: u64, threshold: f64, wait_ms: u64, normalize_to: Price) -> Self {
        Self {
            window_ms,
            threshold,
            wait_ms,
            normalize_to,
            steps: VecDeque::new(),
            total: 0,
            last: None,
            last_breach: None,
        }
    }

    /// Feed a tick; returns the normalized movement after the update
    ///
    /// A step leaves the window once the tick it starts from is more than
    /// `window_ms` old.
    pub fn update(&mut self, tick: &Tick) -> f64 {
        if let Some((prev_time, prev_ask)) = self.last {
            let step = (tick.ask - prev_ask).abs();
            self.steps.push_back((prev_time, step));
            self.total += step;
        }
        self.last = Some((tick.time, tick.ask));

        while let Some(&(time, step)) = self.steps.front() {
            if time + self.window_ms < tick.time {
                self.total -= step;
                self.steps.pop_front();
            } else {
                break;
            }
        }

        let movement = self.normalized(tick.ask);
        if movement > self.threshold {
            if self.check(tick.time).is_ok() {
                tracing::debug!(time = tick.time, movement, "Movement above threshold");
            }
            self.last_breach = Some(tick.time);
        }
        movement
    }

    /// Accumulated movement normalized at `ask`
    pub fn normalized(&self, ask: Price) -> f64 {
        if ask <= 0 {
            return 0.0;
        }
        let rate = ask as f64 / self.normalize_to as f64;
        self.total as f64 / rate
    }

    /// Raw accumulated movement in price points
    pub fn total(&self) -> Price {
        self.total
    }

    /// Reject if a breach happened less than `wait_ms` ago
    pub fn check(&self, now: TimeMs) -> Result<(), GateRejection> {
        match self.last_breach {
            Some(breached_at) if now < breached_at + self.wait_ms || now == breached_at => {
                Err(GateRejection::Movement {
                    breached_at,
                    until: breached_at + self.wait_ms,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Minimum delay between open decisions
#[derive(Debug, Clone)]
pub struct Cooldown {
    wait_ms: u64,
    last_open: Option<TimeMs>,
}

impl Cooldown {
    /// Create a cooldown
    pub fn new(wait_ms: u64) -> Self {
        Self {
            wait_ms,
            last_open: None,
        }
    }

    /// Record an open decision
    pub fn record_open(&mut self, time: TimeMs) {
        self.last_open = Some(time);
    }

    /// Reject if the previous open was less than `wait_ms` ago
    pub fn check(&self, now: TimeMs) -> Result<(), GateRejection> {
        match self.last_open {
            Some(opened) if now < opened + self.wait_ms => Err(GateRejection::Cooldown {
                until: opened + self.wait_ms,
            }),
            _ => Ok(()),
        }
    }
}

/// All open gates, checked spread first
#[derive(Debug, Clone)]
pub struct OpenGates {
    pub max_spread: Price,
    pub movement: MovementGate,
    pub cooldown: Cooldown,
}

impl OpenGates {
    /// Update per-tick state
    pub fn observe(&mut self, tick: &Tick) -> f64 {
        self.movement.update(tick)
    }

    /// Whether a position may be opened on this tick
    pub fn check(&self, tick: &Tick) -> Result<(), GateRejection> {
        let spread = tick.spread();
        if spread > self.max_spread {
            return Err(GateRejection::Spread {
                spread,
                max: self.max_spread,
            });
        }
        self.movement.check(tick.time)?;
        self.cooldown.check(tick.time)
    }
}
