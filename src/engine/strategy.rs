//! Strategy construction from configuration

use super::EngineError;
use crate::classifier::{
    FeatureStrategy, KnnClassifier, KnnParams, PatternCatalog, TrainingData, TrainingError,
};
use crate::config::{Config, StrategyKind};

/// Build the configured strategy, loading training data for KNN
///
/// Every configured window must have a training set.
pub fn build_strategy(config: &Config) -> Result<Box<dyn FeatureStrategy>, EngineError> {
    match config.strategy.kind {
        StrategyKind::Knn => {
            let training = TrainingData::from_csv(&config.knn.training_file)?;
            if let Some(spec) = config
                .windows
                .iter()
                .find(|spec| training.get(spec.width_ms).is_none())
            {
                return Err(TrainingError::MissingWidth {
                    width_ms: spec.width_ms,
                }
                .into());
            }
            let params = KnnParams {
                k: config.knn.k,
                threshold: config.knn.threshold,
                outcome_cut: config.knn.outcome_cut,
                min_r_squared: config.knn.min_r_squared,
                max_ms_per_tick: config.knn.max_ms_per_tick,
            };
            Ok(Box::new(KnnClassifier::new(params, training)?))
        }
        StrategyKind::Catalog => {
            let catalog = PatternCatalog::new(config.catalog.clone());
            tracing::info!(entries = catalog.len(), "Loaded pattern catalog");
            Ok(Box::new(catalog))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CatalogEntry;
    use crate::feature::WindowSpec;
    use crate::signal::Side;
    use std::io::Write;

    #[test]
    fn test_builds_knn_from_training_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..10 {
            writeln!(file, "60000,{},{},25,-30", i as f64 * 0.1, (i % 3) as f64).unwrap();
        }
        file.flush().unwrap();

        let mut config = Config::default();
        config.knn.training_file = file.path().to_path_buf();
        let strategy = build_strategy(&config).unwrap();
        assert_eq!(strategy.name(), "knn");
    }

    #[test]
    fn test_knn_rejects_window_without_training() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..10 {
            writeln!(file, "60000,{},{},25,-30", i as f64 * 0.1, (i % 3) as f64).unwrap();
        }
        file.flush().unwrap();

        let mut config = Config::default();
        config.windows = vec![WindowSpec::new(30_000, 6, 8), WindowSpec::new(60_000, 6, 8)];
        config.knn.training_file = file.path().to_path_buf();
        assert!(matches!(
            build_strategy(&config),
            Err(EngineError::Training(TrainingError::MissingWidth { width_ms: 30_000 }))
        ));
    }

    #[test]
    fn test_knn_needs_training_file() {
        let mut config = Config::default();
        config.knn.training_file = "/nonexistent/training.csv".into();
        assert!(matches!(
            build_strategy(&config),
            Err(EngineError::Training(_))
        ));
    }

    #[test]
    fn test_builds_catalog() {
        let mut config = Config::default();
        config.strategy.kind = StrategyKind::Catalog;
        config.catalog.push(CatalogEntry {
            side: Side::Sell,
            min_width: 0,
            max_width: 120_000,
            min_factor: 1,
            max_factor: 100,
            pattern: "41".into(),
            label: "dip".into(),
        });
        let strategy = build_strategy(&config).unwrap();
        assert_eq!(strategy.name(), "catalog");
    }
}
