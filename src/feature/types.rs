//! Feature types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One configured lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Lookback duration in milliseconds
    pub width_ms: u64,
    /// Number of time buckets in the bitmap
    pub bit_width: u32,
    /// Number of price buckets in the bitmap
    pub bit_height: u32,
}

impl WindowSpec {
    /// Create a new window spec
    pub fn new(width_ms: u64, bit_width: u32, bit_height: u32) -> Self {
        Self {
            width_ms,
            bit_width,
            bit_height,
        }
    }

    /// Number of bytes needed to hold the bitmap
    pub fn byte_count(&self) -> usize {
        ((self.bit_width * self.bit_height) as usize).div_ceil(8)
    }

    /// Milliseconds covered by one time bucket
    pub fn time_factor(&self) -> u64 {
        (self.width_ms / self.bit_width as u64).max(1)
    }
}

/// What the encoder does with a window that history does not yet cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncompletePolicy {
    /// Report insufficient history and skip the width
    #[default]
    Skip,
    /// Emit the all-bits-set sentinel fingerprint
    Sentinel,
}

/// Quantized raster of a price window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitmapFingerprint {
    /// Window width this fingerprint was computed over
    pub width_ms: u64,
    /// Price quantization step (0 for the sentinel)
    pub price_factor: u32,
    /// Packed bits, LSB first within each byte
    pub bytes: Vec<u8>,
}

impl BitmapFingerprint {
    /// All-bits-set fingerprint used for incomplete windows
    pub fn sentinel(spec: &WindowSpec) -> Self {
        Self {
            width_ms: spec.width_ms,
            price_factor: 0,
            bytes: vec![0xff; spec.byte_count()],
        }
    }

    /// Whether this is the incomplete-window sentinel
    pub fn is_sentinel(&self) -> bool {
        self.price_factor == 0
    }

    /// Canonical lowercase hex form
    pub fn hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Whether a bit is set
    pub fn bit(&self, pos: usize) -> bool {
        self.bytes
            .get(pos / 8)
            .is_some_and(|byte| byte & (1 << (pos % 8)) != 0)
    }
}

impl fmt::Display for BitmapFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.width_ms, self.price_factor, self.hex())
    }
}

/// Quadratic trend fit `y = a·x² + b·x + c`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadFit {
    /// Quadratic coefficient
    pub a: f64,
    /// Linear coefficient
    pub b: f64,
    /// Constant coefficient
    pub c: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Number of points fitted
    pub samples: usize,
}

impl QuadFit {
    /// Evaluate the fitted curve
    pub fn predict(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }
}

/// Reasons a window yields no feature
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// History does not yet cover the window
    #[error("Insufficient history for {width_ms}ms window")]
    InsufficientHistory { width_ms: u64 },
    /// No points inside the window
    #[error("No samples to fit")]
    NoSamples,
    /// Normal equations have a zero pivot
    #[error("Singular normal equations")]
    SingularSystem,
    /// Total variance is zero, R² undefined
    #[error("Constant price series")]
    ConstantSeries,
    /// Current price cannot be used as a normalization rate
    #[error("Invalid normalization price: {0}")]
    InvalidPrice(i64),
}

impl FeatureError {
    /// Whether this is a degenerate quadratic fit rather than missing data
    pub fn is_degenerate_fit(&self) -> bool {
        matches!(
            self,
            FeatureError::NoSamples | FeatureError::SingularSystem | FeatureError::ConstantSeries
        )
    }
}
