//! Per-tick feature extraction across all configured windows

use super::{
    BitmapEncoder, BitmapFingerprint, FeatureError, IncompletePolicy, QuadFit, QuadraticFitter,
    Window, WindowSpec,
};
use crate::feed::Price;
use crate::history::RingBuffer;

/// Features of one window at one tick
#[derive(Debug, Clone)]
pub struct WindowFeatures {
    /// Window configuration
    pub spec: WindowSpec,
    /// Whether history covers the whole window
    pub complete: bool,
    /// Samples inside the window
    pub samples: usize,
    /// Average spacing between samples
    pub ms_per_tick: Option<f64>,
    /// Bitmap fingerprint or the reason there is none
    pub bitmap: Result<BitmapFingerprint, FeatureError>,
    /// Quadratic fit or the reason there is none
    pub fit: Result<QuadFit, FeatureError>,
}

/// Runs the encoder and fitter for every configured window
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    encoders: Vec<BitmapEncoder>,
    fitter: QuadraticFitter,
    normalize_to: Price,
}

impl FeatureExtractor {
    /// Create an extractor over windows in configured order
    pub fn new(windows: &[WindowSpec], policy: IncompletePolicy, normalize_to: Price) -> Self {
        Self {
            encoders: windows
                .iter()
                .map(|spec| BitmapEncoder::new(*spec, policy))
                .collect(),
            fitter: QuadraticFitter,
            normalize_to,
        }
    }

    /// Configured windows
    pub fn windows(&self) -> impl Iterator<Item = &WindowSpec> {
        self.encoders.iter().map(BitmapEncoder::spec)
    }

    /// Extract features for one window
    pub fn extract_one(
        &self,
        ring: &RingBuffer,
        index: u64,
        encoder: &BitmapEncoder,
    ) -> Result<WindowFeatures, FeatureError> {
        let spec = *encoder.spec();
        let window = Window::collect(ring, index, spec.width_ms, self.normalize_to)?;
        Ok(WindowFeatures {
            spec,
            complete: window.complete,
            samples: window.samples.len(),
            ms_per_tick: window.ms_per_tick(),
            bitmap: encoder.encode(&window),
            fit: self.fitter.fit(&window),
        })
    }

    /// Extract features for every window at `index`
    ///
    /// Windows whose current sample cannot be read are left out.
    pub fn extract(&self, ring: &RingBuffer, index: u64) -> Vec<WindowFeatures> {
        self.encoders
            .iter()
            .filter_map(|encoder| match self.extract_one(ring, index, encoder) {
                Ok(features) => Some(features),
                Err(e) => {
                    tracing::debug!(width_ms = encoder.spec().width_ms, error = %e, "No window");
                    None
                }
            })
            .collect()
    }
}
