//! Window feature extraction: bitmap fingerprints and quadratic trend fits

mod bitmap;
mod extractor;
mod quadratic;
mod types;
mod window;

pub use bitmap::{price_factor, BitmapEncoder};
pub use extractor::{FeatureExtractor, WindowFeatures};
pub use quadratic::{fit_quadratic, QuadraticFitter};
pub use types::{BitmapFingerprint, FeatureError, IncompletePolicy, QuadFit, WindowSpec};
pub use window::Window;
