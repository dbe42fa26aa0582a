//! Window classification strategies
//!
//! Two strategies share the [`FeatureStrategy`] seam: KNN over historical
//! quadratic-fit features and exact matching against a fingerprint catalog.

mod catalog;
mod knn;
mod training;
mod types;

pub use catalog::{CatalogEntry, PatternCatalog};
pub use knn::{KnnClassifier, KnnParams, Neighbourhood};
pub use training::{Normalization, TrainingData, TrainingRow, TrainingSet, TrainingVector};
pub use types::{FeatureStrategy, PassReason, TradeIntent, TrainingError, Verdict};
