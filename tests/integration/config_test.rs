//! Configuration loading tests

use std::io::Write;
use tickfit::config::{Config, ExecutionMode, StrategyKind};

#[test]
fn test_load_example_config() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();
    assert_eq!(config.instrument.symbol, "USDJPY");
    assert_eq!(config.strategy.kind, StrategyKind::Knn);
    assert_eq!(config.execution.mode, ExecutionMode::Paper);
    assert_eq!(config.windows.len(), 1);
}

#[test]
fn test_load_rejects_invalid_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[knn]\nk = 0").unwrap();
    file.flush().unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("knn.k"));
}

#[test]
fn test_load_rejects_unparseable_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[[windows]]\nwidth_ms = \"wide\"").unwrap();
    file.flush().unwrap();

    assert!(Config::load(file.path()).is_err());
}
