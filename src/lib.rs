//! tickfit: tick-level feature extraction and trade decisions for intraday FX
//!
//! This library provides the core components for:
//! - Fixed-capacity tick history with time-window lookups
//! - Bitmap fingerprints and quadratic trend fits per time window
//! - KNN and pattern-catalog classification of window features
//! - Open gating, lot sizing and a position state machine
//! - Paper execution and signal publishing for split deployments
//! - Outcome labeling for training data
//! - Structured logging and Prometheus metrics

pub mod classifier;
pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod execution;
pub mod feature;
pub mod feed;
pub mod history;
pub mod labeling;
pub mod position;
pub mod risk;
pub mod signal;
pub mod telemetry;
