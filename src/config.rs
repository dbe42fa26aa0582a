//! Configuration types for tickfit

use crate::classifier::CatalogEntry;
use crate::feature::{IncompletePolicy, WindowSpec};
use crate::feed::Price;
use crate::position::{CheckInterval, ClosePolicy, ReferenceMode};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub instrument: InstrumentConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowSpec>,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub knn: KnnConfig,
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
    #[serde(default)]
    pub gates: GatesConfig,
    #[serde(default)]
    pub close: CloseConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Instrument and price normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Fixed-point multiplier applied to quotes (1000 → 0.001 resolution)
    #[serde(default = "default_price_scale")]
    pub price_scale: i64,
    /// Level the current price is normalized to in every window
    #[serde(default = "default_normalize_to")]
    pub normalize_to: Price,
}

fn default_symbol() -> String {
    "USDJPY".to_string()
}

fn default_price_scale() -> i64 {
    1000
}

fn default_normalize_to() -> Price {
    100_000
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            price_scale: default_price_scale(),
            normalize_to: default_normalize_to(),
        }
    }
}

/// Tick history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    10_000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_windows() -> Vec<WindowSpec> {
    vec![WindowSpec::new(60_000, 6, 8)]
}

/// Feature extraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default)]
    pub incomplete: IncompletePolicy,
}

/// Which strategy classifies windows
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Knn,
    Catalog,
}

/// Strategy selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub kind: StrategyKind,
}

/// KNN classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_threshold")]
    pub threshold: i32,
    #[serde(default = "default_outcome_cut")]
    pub outcome_cut: f64,
    #[serde(default = "default_min_r_squared")]
    pub min_r_squared: f64,
    /// Maximum average tick spacing; `None` disables the density check
    #[serde(default = "default_max_ms_per_tick")]
    pub max_ms_per_tick: Option<f64>,
    #[serde(default = "default_training_file")]
    pub training_file: PathBuf,
}

fn default_k() -> usize {
    8
}

fn default_threshold() -> i32 {
    5
}

fn default_outcome_cut() -> f64 {
    20.0
}

fn default_min_r_squared() -> f64 {
    0.95
}

fn default_max_ms_per_tick() -> Option<f64> {
    Some(250.0)
}

fn default_training_file() -> PathBuf {
    PathBuf::from("training.csv")
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            threshold: default_threshold(),
            outcome_cut: default_outcome_cut(),
            min_r_squared: default_min_r_squared(),
            max_ms_per_tick: default_max_ms_per_tick(),
            training_file: default_training_file(),
        }
    }
}

/// Open gates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatesConfig {
    /// Widest allowed spread in price points
    #[serde(default = "default_max_spread")]
    pub max_spread: Price,
    #[serde(default = "default_movement_window_ms")]
    pub movement_window_ms: u64,
    /// Normalized accumulated |Δask| that counts as a breach
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: f64,
    #[serde(default = "default_movement_wait_ms")]
    pub movement_wait_ms: u64,
    /// Minimum time between open decisions
    #[serde(default = "default_wait_time_ms")]
    pub wait_time_ms: u64,
}

fn default_max_spread() -> Price {
    9
}

fn default_movement_window_ms() -> u64 {
    300_000
}

fn default_movement_threshold() -> f64 {
    500.0
}

fn default_movement_wait_ms() -> u64 {
    600_000
}

fn default_wait_time_ms() -> u64 {
    60_000
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            max_spread: default_max_spread(),
            movement_window_ms: default_movement_window_ms(),
            movement_threshold: default_movement_threshold(),
            movement_wait_ms: default_movement_wait_ms(),
            wait_time_ms: default_wait_time_ms(),
        }
    }
}

/// Close policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseConfig {
    #[serde(default = "default_interval")]
    pub interval: CheckInterval,
    #[serde(default)]
    pub reference: ReferenceMode,
    #[serde(default)]
    pub min_profit: Price,
    /// Stop-loss distance in price points
    #[serde(default = "default_loss_cut")]
    pub loss_cut: Price,
}

fn default_interval() -> CheckInterval {
    CheckInterval::QuarterWindow
}

fn default_loss_cut() -> Price {
    50
}

impl Default for CloseConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            reference: ReferenceMode::default(),
            min_profit: 0,
            loss_cut: default_loss_cut(),
        }
    }
}

impl CloseConfig {
    /// Close policy for the position book
    pub fn policy(&self) -> ClosePolicy {
        ClosePolicy {
            interval: self.interval,
            reference: self.reference,
            min_profit: self.min_profit,
        }
    }
}

/// Lot sizing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    #[serde(default = "default_leverage")]
    pub leverage: Decimal,
    #[serde(default = "default_margin_usage")]
    pub margin_usage: Decimal,
    /// Units per lot
    #[serde(default = "default_contract_size")]
    pub contract_size: Decimal,
    #[serde(default = "default_lot_step")]
    pub lot_step: Decimal,
    #[serde(default = "default_max_lots_per_position")]
    pub max_lots_per_position: Decimal,
    #[serde(default = "default_max_lots_per_account")]
    pub max_lots_per_account: Decimal,
    #[serde(default = "default_max_legs")]
    pub max_legs: usize,
}

fn default_leverage() -> Decimal {
    dec!(25)
}

fn default_margin_usage() -> Decimal {
    dec!(0.92)
}

fn default_contract_size() -> Decimal {
    dec!(1000)
}

fn default_lot_step() -> Decimal {
    dec!(0.1)
}

fn default_max_lots_per_position() -> Decimal {
    dec!(10)
}

fn default_max_lots_per_account() -> Decimal {
    dec!(100)
}

fn default_max_legs() -> usize {
    100
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            leverage: default_leverage(),
            margin_usage: default_margin_usage(),
            contract_size: default_contract_size(),
            lot_step: default_lot_step(),
            max_lots_per_position: default_max_lots_per_position(),
            max_lots_per_account: default_max_lots_per_account(),
            max_legs: default_max_legs(),
        }
    }
}

/// Execution mode: paper account or signal publishing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Signal,
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
}

fn default_initial_balance() -> Decimal {
    dec!(1000000)
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            initial_balance: default_initial_balance(),
        }
    }
}

/// Signal artifact channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "default_signal_dir")]
    pub dir: PathBuf,
    /// Artifacts older than this are discarded unread
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    /// Consume Close artifacts from the channel while a position is open
    #[serde(default)]
    pub inbox: bool,
    /// Smallest stop-loss distance the follower accepts
    #[serde(default = "default_min_loss_cut")]
    pub min_loss_cut: Price,
}

fn default_signal_dir() -> PathBuf {
    PathBuf::from("./signals")
}

fn default_max_age_secs() -> u64 {
    10
}

fn default_min_loss_cut() -> Price {
    56
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            dir: default_signal_dir(),
            max_age_secs: default_max_age_secs(),
            inbox: false,
            min_loss_cut: default_min_loss_cut(),
        }
    }
}

impl SignalConfig {
    /// Staleness limit as a chrono duration
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_age_secs.min(i64::MAX as u64) as i64)
    }
}

/// Record output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_true")]
    pub record_ticks: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_true() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            record_ticks: true,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Prometheus exporter port; disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// Configuration errors, fatal at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("At least one window must be configured")]
    NoWindows,
    #[error("Window {width_ms}ms: bit_height {bit_height} must be even and at least 4")]
    BadBitHeight { width_ms: u64, bit_height: u32 },
    #[error("Window {width_ms}ms: bit_width must be between 1 and width_ms")]
    BadBitWidth { width_ms: u64, bit_width: u32 },
    #[error("History capacity must be positive")]
    ZeroCapacity,
    #[error("knn.k must be positive")]
    ZeroK,
    #[error("knn.outcome_cut must be positive")]
    BadOutcomeCut,
    #[error("Catalog strategy selected but no catalog entries configured")]
    EmptyCatalog,
    #[error("Catalog entry {index} has an invalid pattern or range")]
    BadCatalogEntry { index: usize },
    #[error("instrument.{0} must be positive")]
    NonPositive(&'static str),
    #[error("sizing.{0} must be positive")]
    BadSizing(&'static str),
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.windows.is_empty() {
            return Err(ConfigError::NoWindows);
        }
        for w in &self.windows {
            if w.bit_height < 4 || w.bit_height % 2 != 0 {
                return Err(ConfigError::BadBitHeight {
                    width_ms: w.width_ms,
                    bit_height: w.bit_height,
                });
            }
            if w.bit_width == 0 || w.width_ms < w.bit_width as u64 {
                return Err(ConfigError::BadBitWidth {
                    width_ms: w.width_ms,
                    bit_width: w.bit_width,
                });
            }
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.instrument.price_scale <= 0 {
            return Err(ConfigError::NonPositive("price_scale"));
        }
        if self.instrument.normalize_to <= 0 {
            return Err(ConfigError::NonPositive("normalize_to"));
        }
        if self.knn.k == 0 {
            return Err(ConfigError::ZeroK);
        }
        if self.knn.outcome_cut.is_nan() || self.knn.outcome_cut <= 0.0 {
            return Err(ConfigError::BadOutcomeCut);
        }
        if self.strategy.kind == StrategyKind::Catalog && self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for (index, entry) in self.catalog.iter().enumerate() {
            let hex_ok = !entry.pattern.is_empty() && hex::decode(entry.pattern.trim()).is_ok();
            if !hex_ok || entry.min_width > entry.max_width || entry.min_factor > entry.max_factor
            {
                return Err(ConfigError::BadCatalogEntry { index });
            }
        }
        let sizing = &self.sizing;
        for (name, value) in [
            ("leverage", sizing.leverage),
            ("margin_usage", sizing.margin_usage),
            ("contract_size", sizing.contract_size),
            ("lot_step", sizing.lot_step),
            ("max_lots_per_position", sizing.max_lots_per_position),
            ("max_lots_per_account", sizing.max_lots_per_account),
        ] {
            if value <= Decimal::ZERO {
                return Err(ConfigError::BadSizing(name));
            }
        }
        if sizing.max_legs == 0 {
            return Err(ConfigError::BadSizing("max_legs"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instrument: InstrumentConfig::default(),
            history: HistoryConfig::default(),
            windows: default_windows(),
            features: FeaturesConfig::default(),
            strategy: StrategyConfig::default(),
            knn: KnnConfig::default(),
            catalog: Vec::new(),
            gates: GatesConfig::default(),
            close: CloseConfig::default(),
            sizing: SizingConfig::default(),
            execution: ExecutionConfig::default(),
            signal: SignalConfig::default(),
            data: DataConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}
