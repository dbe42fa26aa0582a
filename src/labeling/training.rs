//! Joins per-tick fits with outcome labels into KNN training rows

use super::OutcomeLabel;
use crate::classifier::TrainingRow;
use crate::feature::{FeatureExtractor, WindowFeatures};
use crate::feed::{Tick, TimeMs};
use crate::history::RingBuffer;
use std::collections::HashMap;

/// Which fits become training rows
///
/// The default keeps every usable fit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrainingFilter {
    /// Fits below this R² are dropped
    pub min_r_squared: f64,
    /// Drop windows averaging more than this many ms per tick
    pub max_ms_per_tick: Option<f64>,
    /// Drop fits whose value at the current tick is this far from zero
    pub max_offset: Option<f64>,
    /// When set, rows of one width are more than `width + horizon_ms` apart
    pub horizon_ms: Option<u64>,
}

impl TrainingFilter {
    fn accepts(&self, features: &WindowFeatures) -> bool {
        let Ok(fit) = &features.fit else {
            return false;
        };
        if fit.r_squared < self.min_r_squared {
            return false;
        }
        if let Some(max) = self.max_ms_per_tick {
            match features.ms_per_tick {
                Some(spacing) if spacing <= max => {}
                _ => return false,
            }
        }
        match self.max_offset {
            Some(max) => fit.c.abs() < max,
            None => true,
        }
    }
}

/// Replay `ticks` through a fresh history and emit rows for windows with a
/// usable fit that pass `filter`
///
/// `labels` must come from [`label_outcomes`](super::label_outcomes) over
/// the same ticks.
pub fn training_rows(
    ticks: &[Tick],
    labels: &[OutcomeLabel],
    extractor: &FeatureExtractor,
    capacity: usize,
    filter: &TrainingFilter,
) -> Vec<TrainingRow> {
    let mut ring = RingBuffer::new(capacity);
    let mut last_row: HashMap<u64, TimeMs> = HashMap::new();
    let mut rows = Vec::new();

    for (tick, label) in ticks.iter().zip(labels) {
        let index = ring.append(tick.time, tick.ask);
        for features in extractor.extract(&ring, index) {
            let width_ms = features.spec.width_ms;
            if let Some(horizon) = filter.horizon_ms {
                let previous = last_row.get(&width_ms).copied().unwrap_or(0);
                if tick.time <= previous + width_ms + horizon {
                    continue;
                }
            }
            if !filter.accepts(&features) {
                continue;
            }
            let Ok(fit) = features.fit else {
                continue;
            };
            rows.push(TrainingRow {
                width_ms,
                linear: fit.b,
                quad: fit.a,
                buy_outcome: label.buy as f64,
                sell_outcome: label.sell as f64,
            });
            last_row.insert(width_ms, tick.time);
        }
    }

    tracing::debug!(ticks = ticks.len(), rows = rows.len(), "Built training rows");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{IncompletePolicy, WindowSpec};
    use crate::labeling::label_outcomes;

    fn extractor(width_ms: u64) -> FeatureExtractor {
        FeatureExtractor::new(
            &[WindowSpec::new(width_ms, 2, 4)],
            IncompletePolicy::Skip,
            100_000,
        )
    }

    /// Rising by one point every `step_ms`
    fn rising(count: u64, step_ms: u64) -> Vec<Tick> {
        (0..count)
            .map(|i| Tick::new(i * step_ms, 100_000 + i as i64, 99_990 + i as i64))
            .collect()
    }

    #[test]
    fn test_rows_only_for_complete_windows() {
        let ticks: Vec<_> = (0..10)
            .map(|i| Tick::new(i * 1000, 100_000 + i as i64 * 10, 99_990 + i as i64 * 10))
            .collect();
        let labels = label_outcomes(&ticks, 30, 0);
        let extractor = FeatureExtractor::new(
            &[WindowSpec::new(3000, 3, 4)],
            IncompletePolicy::Skip,
            100_000,
        );

        let rows = training_rows(&ticks, &labels, &extractor, 100, &TrainingFilter::default());
        // the window is complete once a sample older than its start exists
        assert!(!rows.is_empty());
        assert!(rows.len() < ticks.len());
        for row in &rows {
            assert_eq!(row.width_ms, 3000);
            // a straight rising line
            assert!(row.linear > 0.0);
            assert!(row.quad.abs() < 1e-9);
        }
    }

    #[test]
    fn test_r_squared_filter() {
        let ticks: Vec<_> = (0..20)
            .map(|i| {
                let wiggle = if i % 2 == 0 { 30 } else { -30 };
                Tick::new(i * 500, 100_000 + wiggle, 99_990 + wiggle)
            })
            .collect();
        let labels = label_outcomes(&ticks, 30, 0);
        let extractor = FeatureExtractor::new(
            &[WindowSpec::new(3000, 3, 4)],
            IncompletePolicy::Skip,
            100_000,
        );
        let filter = TrainingFilter {
            min_r_squared: 0.99,
            ..TrainingFilter::default()
        };
        assert!(training_rows(&ticks, &labels, &extractor, 100, &filter).is_empty());
    }

    #[test]
    fn test_rows_do_not_overlap() {
        let ticks = rising(100, 100);
        let labels = label_outcomes(&ticks, 30, 0);
        let filter = TrainingFilter {
            horizon_ms: Some(500),
            ..TrainingFilter::default()
        };

        let rows = training_rows(&ticks, &labels, &extractor(1000), 200, &filter);
        // t = 1600, 3200, 4800, 6400, 8000, 9600
        assert_eq!(rows.len(), 6);

        let every_tick = training_rows(
            &ticks,
            &labels,
            &extractor(1000),
            200,
            &TrainingFilter::default(),
        );
        assert!(every_tick.len() > 80);
    }

    #[test]
    fn test_sparse_windows_are_dropped() {
        let ticks = rising(30, 400);
        let labels = label_outcomes(&ticks, 30, 0);
        let filter = TrainingFilter {
            max_ms_per_tick: Some(250.0),
            ..TrainingFilter::default()
        };

        // 3000ms over 8 samples is ~428ms per tick
        assert!(training_rows(&ticks, &labels, &extractor(3000), 100, &filter).is_empty());
        assert!(!training_rows(
            &ticks,
            &labels,
            &extractor(3000),
            100,
            &TrainingFilter::default()
        )
        .is_empty());
    }

    #[test]
    fn test_offset_filter() {
        // flat, then one jump on the last tick
        let mut ticks: Vec<_> = (0..20).map(|i| Tick::new(i * 100, 100_000, 99_990)).collect();
        ticks.push(Tick::new(2000, 100_100, 100_090));
        let labels = label_outcomes(&ticks, 30, 0);

        // flat windows have no fit; only the last tick yields a row
        let rows = training_rows(
            &ticks,
            &labels,
            &extractor(1000),
            100,
            &TrainingFilter::default(),
        );
        assert_eq!(rows.len(), 1);

        let filter = TrainingFilter {
            max_offset: Some(3.0),
            ..TrainingFilter::default()
        };
        assert!(training_rows(&ticks, &labels, &extractor(1000), 100, &filter).is_empty());
    }
}
