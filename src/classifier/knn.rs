//! K-nearest-neighbour classification over quadratic-fit features

use super::{
    FeatureStrategy, PassReason, TradeIntent, TrainingData, TrainingError, TrainingSet, Verdict,
};
use crate::feature::WindowFeatures;
use crate::signal::Side;

/// KNN tuning parameters
#[derive(Debug, Clone)]
pub struct KnnParams {
    /// Neighbours to consult
    pub k: usize,
    /// Net outcome votes needed to act
    pub threshold: i32,
    /// Outcome magnitude counted as a win or loss
    pub outcome_cut: f64,
    /// Minimum fit quality for a query
    pub min_r_squared: f64,
    /// Maximum average spacing between ticks in the window
    pub max_ms_per_tick: Option<f64>,
}

/// Neighbourhood summary for one query
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbourhood {
    /// Training indices of the k nearest, nearest first
    pub indices: Vec<usize>,
    /// Distance from the query to the k-th neighbour
    pub radius: f64,
    /// Distance from the query to the neighbours' centroid
    pub centroid_distance: f64,
    /// Net buy votes
    pub buy_tally: i32,
    /// Net sell votes
    pub sell_tally: i32,
}

/// KNN strategy over per-width training sets
pub struct KnnClassifier {
    params: KnnParams,
    training: TrainingData,
}

impl KnnClassifier {
    /// Create a classifier; every training set must hold at least `k` rows
    pub fn new(params: KnnParams, training: TrainingData) -> Result<Self, TrainingError> {
        for set in training.sets() {
            if set.len() < params.k {
                return Err(TrainingError::TooFewRows {
                    width_ms: set.width_ms,
                    rows: set.len(),
                    k: params.k,
                });
            }
        }
        Ok(Self { params, training })
    }

    /// Classifier parameters
    pub fn params(&self) -> &KnnParams {
        &self.params
    }

    /// Find the neighbourhood of a raw `(linear, quad)` query
    pub fn neighbourhood(&self, set: &TrainingSet, linear: f64, quad: f64) -> Option<Neighbourhood> {
        let k = self.params.k.min(set.len());
        if k == 0 {
            return None;
        }
        let (ql, qq) = set.normalization.apply(linear, quad);

        let mut distances: Vec<(f64, usize)> = set
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| ((v.linear - ql).powi(2) + (v.quad - qq).powi(2), i))
            .collect();
        let by_distance =
            |x: &(f64, usize), y: &(f64, usize)| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1));
        if k < distances.len() {
            distances.select_nth_unstable_by(k - 1, by_distance);
            distances.truncate(k);
        }
        distances.sort_by(by_distance);

        let (mut cl, mut cq) = (0.0, 0.0);
        let (mut buy_tally, mut sell_tally) = (0, 0);
        for &(_, i) in &distances {
            let v = &set.vectors[i];
            cl += v.linear;
            cq += v.quad;
            buy_tally += self.vote(v.buy_outcome);
            sell_tally += self.vote(v.sell_outcome);
        }
        cl /= k as f64;
        cq /= k as f64;

        Some(Neighbourhood {
            indices: distances.iter().map(|&(_, i)| i).collect(),
            radius: distances[k - 1].0.sqrt(),
            centroid_distance: ((cl - ql).powi(2) + (cq - qq).powi(2)).sqrt(),
            buy_tally,
            sell_tally,
        })
    }

    fn vote(&self, outcome: f64) -> i32 {
        if outcome >= self.params.outcome_cut {
            1
        } else if outcome <= -self.params.outcome_cut {
            -1
        } else {
            0
        }
    }
}

impl FeatureStrategy for KnnClassifier {
    fn name(&self) -> &'static str {
        "knn"
    }

    fn evaluate(&self, features: &WindowFeatures) -> Verdict {
        let width_ms = features.spec.width_ms;
        let fit = match &features.fit {
            Ok(fit) => fit,
            Err(e) => return Verdict::Pass(PassReason::NoFeature(e.clone())),
        };
        if fit.r_squared < self.params.min_r_squared {
            return Verdict::Pass(PassReason::PoorFit(fit.r_squared));
        }
        if let Some(max_spacing) = self.params.max_ms_per_tick {
            match features.ms_per_tick {
                Some(spacing) if spacing <= max_spacing => {}
                _ => return Verdict::Pass(PassReason::Sparse),
            }
        }
        let Some(set) = self.training.get(width_ms) else {
            return Verdict::Pass(PassReason::Untrained);
        };
        let Some(hood) = self.neighbourhood(set, fit.b, fit.a) else {
            return Verdict::Pass(PassReason::Untrained);
        };

        if hood.centroid_distance > hood.radius / 2.0 {
            return Verdict::Pass(PassReason::OutsideRadius);
        }

        let side = if hood.buy_tally >= self.params.threshold {
            Side::Buy
        } else if hood.sell_tally >= self.params.threshold {
            Side::Sell
        } else {
            return Verdict::Pass(PassReason::BelowThreshold {
                buy: hood.buy_tally,
                sell: hood.sell_tally,
            });
        };

        Verdict::Act(TradeIntent {
            side,
            width_ms,
            provenance: format!(
                "knn:{}:{}:{}:{}",
                width_ms, fit.r_squared, hood.buy_tally, hood.sell_tally
            ),
        })
    }
}
