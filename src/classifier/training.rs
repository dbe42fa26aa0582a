//! Historical training vectors
//!
//! Rows are `width_ms,linear,quad,buy_outcome,sell_outcome`. Feature columns
//! are standardized per width with the population mean and standard
//! deviation, and queries are normalized with the same statistics.

use super::TrainingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One raw training row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    /// Window width the features were computed over
    pub width_ms: u64,
    /// Linear coefficient `b`
    pub linear: f64,
    /// Quadratic coefficient `a`
    pub quad: f64,
    /// Labeled buy outcome in price points
    pub buy_outcome: f64,
    /// Labeled sell outcome in price points
    pub sell_outcome: f64,
}

/// Standardized feature vector with its outcomes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingVector {
    pub linear: f64,
    pub quad: f64,
    pub buy_outcome: f64,
    pub sell_outcome: f64,
}

/// Per-column standardization statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub linear_mean: f64,
    pub linear_std: f64,
    pub quad_mean: f64,
    pub quad_std: f64,
}

impl Normalization {
    /// Standardize a `(linear, quad)` pair
    pub fn apply(&self, linear: f64, quad: f64) -> (f64, f64) {
        (
            (linear - self.linear_mean) / self.linear_std,
            (quad - self.quad_mean) / self.quad_std,
        )
    }
}

/// Training vectors for one window width
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub width_ms: u64,
    pub normalization: Normalization,
    pub vectors: Vec<TrainingVector>,
}

impl TrainingSet {
    /// Build a standardized set from raw rows of one width
    pub fn from_rows(width_ms: u64, rows: &[TrainingRow]) -> Result<Self, TrainingError> {
        let (linear_mean, linear_std) = mean_std(rows.iter().map(|r| r.linear));
        let (quad_mean, quad_std) = mean_std(rows.iter().map(|r| r.quad));
        if linear_std.is_nan() || linear_std <= 0.0 {
            return Err(TrainingError::ZeroVariance {
                width_ms,
                column: "linear",
            });
        }
        if quad_std.is_nan() || quad_std <= 0.0 {
            return Err(TrainingError::ZeroVariance {
                width_ms,
                column: "quad",
            });
        }

        let normalization = Normalization {
            linear_mean,
            linear_std,
            quad_mean,
            quad_std,
        };
        let vectors = rows
            .iter()
            .map(|row| {
                let (linear, quad) = normalization.apply(row.linear, row.quad);
                TrainingVector {
                    linear,
                    quad,
                    buy_outcome: row.buy_outcome,
                    sell_outcome: row.sell_outcome,
                }
            })
            .collect();

        Ok(Self {
            width_ms,
            normalization,
            vectors,
        })
    }

    /// Number of vectors
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Population mean and standard deviation
fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    (mean, var.sqrt())
}

/// Training sets keyed by window width
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    sets: BTreeMap<u64, TrainingSet>,
}

impl TrainingData {
    /// Group rows by width and standardize each group
    pub fn from_rows(rows: &[TrainingRow]) -> Result<Self, TrainingError> {
        let mut grouped: BTreeMap<u64, Vec<TrainingRow>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.width_ms).or_default().push(*row);
        }
        let sets = grouped
            .into_iter()
            .map(|(width, rows)| TrainingSet::from_rows(width, &rows).map(|set| (width, set)))
            .collect::<Result<_, _>>()?;
        Ok(Self { sets })
    }

    /// Load headerless training rows from CSV
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, TrainingError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let row = record
                .deserialize::<TrainingRow>(None)
                .map_err(|e| TrainingError::Malformed {
                    line: line + 1,
                    reason: e.to_string(),
                })?;
            rows.push(row);
        }

        let data = Self::from_rows(&rows)?;
        tracing::info!(
            rows = rows.len(),
            widths = data.sets.len(),
            "Loaded training data"
        );
        Ok(data)
    }

    /// Training set for a width
    pub fn get(&self, width_ms: u64) -> Option<&TrainingSet> {
        self.sets.get(&width_ms)
    }

    /// Iterate training sets in width order
    pub fn sets(&self) -> impl Iterator<Item = &TrainingSet> {
        self.sets.values()
    }
}
