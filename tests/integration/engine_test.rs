//! End-to-end engine tests

use rust_decimal_macros::dec;
use std::sync::Arc;
use tickfit::classifier::{KnnClassifier, KnnParams, TrainingData, TrainingRow};
use tickfit::config::Config;
use tickfit::data::{MemoryRecorder, OrderEvent};
use tickfit::engine::{Engine, TickHandler, TickOutcome, Trader};
use tickfit::execution::PaperVenue;
use tickfit::feature::{fit_quadratic, FeatureExtractor, IncompletePolicy, WindowSpec};
use tickfit::feed::{ReplayFeed, Tick};
use tickfit::history::RingBuffer;
use tickfit::position::{CloseReason, PositionBook};
use tickfit::risk::{GateRejection, LotSizer};

#[test]
fn test_three_tick_scenario() {
    let spec = WindowSpec::new(2000, 2, 4);
    let extractor = FeatureExtractor::new(&[spec], IncompletePolicy::Skip, 100_000);
    let mut ring = RingBuffer::new(16);
    let mut last = 0;
    for (time, price) in [(0, 100_000), (1000, 100_050), (2000, 100_100)] {
        last = ring.append(time, price);
    }

    let features = extractor.extract(&ring, last);
    assert_eq!(features.len(), 1);
    let fingerprint = features[0].bitmap.as_ref().unwrap();
    assert_eq!(fingerprint.price_factor, 25);
    assert_eq!(fingerprint.hex(), "41");

    // all three points, normalized against the current price
    let rate = 100_100.0 / 100_000.0;
    let points: Vec<(f64, f64)> = [(0.0, 100_000.0), (1000.0, 100_050.0), (2000.0, 100_100.0)]
        .iter()
        .map(|(t, p)| (t - 2000.0, p / rate - 100_000.0))
        .collect();
    let fit = fit_quadratic(&points).unwrap();
    assert!(fit.a.abs() < 1e-9);
    assert!((fit.r_squared - 1.0).abs() < 1e-9);
}

/// Straight rising line after an initial jump
///
/// The jump from t=0 to t=100 breaches the movement threshold. The step
/// leaves the 500ms movement window after t=500, so the last breach is at
/// t=500 and opens are blocked until 2500.
fn jump_then_trend() -> Vec<Tick> {
    let mut ticks = vec![Tick::new(0, 100_000, 99_995), Tick::new(100, 100_100, 100_095)];
    for i in 0..40 {
        let time = 200 + i * 100;
        let ask = 100_100 + i as i64;
        ticks.push(Tick::new(time, ask, ask - 5));
    }
    ticks
}

/// Training rows centred on a slope of 0.01 points/ms, all winning buys
fn trend_training() -> TrainingData {
    let rows: Vec<TrainingRow> = [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)]
        .iter()
        .map(|(dl, dq)| TrainingRow {
            width_ms: 1000,
            linear: 0.01 + dl * 0.005,
            quad: dq * 1e-6,
            buy_outcome: 30.0,
            sell_outcome: -30.0,
        })
        .collect();
    TrainingData::from_rows(&rows).unwrap()
}

fn trend_config() -> Config {
    let mut config = Config::default();
    config.windows = vec![WindowSpec::new(1000, 2, 4)];
    config.gates.movement_window_ms = 500;
    config.gates.movement_threshold = 50.0;
    config.gates.movement_wait_ms = 2000;
    config.gates.wait_time_ms = 0;
    config
}

fn knn_engine(config: &Config, recorder: &MemoryRecorder) -> Engine {
    let knn = KnnClassifier::new(
        KnnParams {
            k: 4,
            threshold: 4,
            outcome_cut: 20.0,
            min_r_squared: 0.95,
            max_ms_per_tick: Some(250.0),
        },
        trend_training(),
    )
    .unwrap();
    let trader = Trader::new(
        PositionBook::new(Some(config.close.policy())),
        LotSizer::from_config(&config.sizing),
        Arc::new(PaperVenue::new(dec!(1000000), 1000, dec!(1000))),
        config.instrument.price_scale,
    )
    .with_recorder(Box::new(recorder.clone()));
    Engine::new(config, Box::new(knn), trader)
}

#[tokio::test]
async fn test_movement_gate_suppresses_knn_open() {
    let config = trend_config();
    let recorder = MemoryRecorder::new();
    let mut engine = knn_engine(&config, &recorder);

    let mut movement_rejections = 0;
    let mut opened_at = None;
    for tick in jump_then_trend() {
        match engine.on_tick(tick).await.unwrap() {
            TickOutcome::Rejected(GateRejection::Movement { until, .. }) => {
                assert!(tick.time < until);
                movement_rejections += 1;
            }
            TickOutcome::Opened(position) => {
                opened_at = Some(position.open_time);
                break;
            }
            _ => {}
        }
    }

    assert!(movement_rejections > 0);
    assert_eq!(opened_at, Some(2500));
    assert_eq!(recorder.orders()[0].event, OrderEvent::Open);
}

#[tokio::test]
async fn test_double_close_records_once() {
    let config = trend_config();
    let recorder = MemoryRecorder::new();
    let mut engine = knn_engine(&config, &recorder);

    for tick in jump_then_trend().into_iter().filter(|t| t.time <= 2500) {
        engine.on_tick(tick).await.unwrap();
    }

    let tick = Tick::new(2650, 100_125, 100_120);
    let first = engine
        .close_position(&tick, CloseReason::External)
        .await
        .unwrap();
    assert!(matches!(first, TickOutcome::Closed(_)));
    let second = engine
        .close_position(&tick, CloseReason::External)
        .await
        .unwrap();
    assert!(matches!(second, TickOutcome::Flat));

    let closes = recorder
        .orders()
        .iter()
        .filter(|o| o.event == OrderEvent::Close)
        .count();
    assert_eq!(closes, 1);
}

#[tokio::test]
async fn test_replay_run_closes_at_shutdown() {
    let config = trend_config();
    let recorder = MemoryRecorder::new();
    let mut engine = knn_engine(&config, &recorder);
    let ticks: Vec<Tick> = jump_then_trend()
        .into_iter()
        .filter(|t| t.time <= 2700)
        .collect();
    let count = ticks.len() as u64;

    let summary = engine.run(&ReplayFeed::from_ticks(ticks)).await.unwrap();
    assert_eq!(summary.ticks, count);
    assert_eq!(summary.opens, 1);
    assert_eq!(summary.closes, 1);
    assert_eq!(recorder.ticks().len(), count as usize);

    let close = recorder
        .orders()
        .into_iter()
        .find(|o| o.event == OrderEvent::Close)
        .unwrap();
    assert_eq!(close.detail, "shutdown");
}
