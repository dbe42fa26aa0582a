//! Label command implementation

use super::output_writer;
use crate::config::Config;
use crate::feature::FeatureExtractor;
use crate::feed::{read_ticks, Price};
use crate::labeling::{label_outcomes, training_rows, TrainingFilter};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Recorded tick file (`time,ask,bid` rows)
    #[arg(short, long)]
    pub ticks: PathBuf,

    /// P/L in price points that settles a label
    #[arg(long, default_value = "30")]
    pub pl_limit: Price,

    /// Extra spread charged on settlement, in price points
    #[arg(long, default_value = "0")]
    pub spread_delta: Price,

    /// Emit KNN training rows instead of raw labels
    #[arg(long)]
    pub training: bool,

    /// Minimum fit R² for training rows
    #[arg(long, default_value = "0.0")]
    pub min_r_squared: f64,

    /// Drop windows averaging more ms per tick (defaults to knn.max_ms_per_tick)
    #[arg(long)]
    pub max_ms_per_tick: Option<f64>,

    /// Drop fits whose current value is this far from zero
    #[arg(long, default_value = "3.0")]
    pub max_offset: f64,

    /// Label horizon in ms; rows of one width are spaced by width plus horizon
    #[arg(long, default_value = "0")]
    pub horizon_ms: u64,

    /// Emit a row for every tick instead of non-overlapping windows
    #[arg(long)]
    pub every_tick: bool,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl LabelArgs {
    fn filter(&self, config: &Config) -> TrainingFilter {
        TrainingFilter {
            min_r_squared: self.min_r_squared,
            max_ms_per_tick: self.max_ms_per_tick.or(config.knn.max_ms_per_tick),
            max_offset: Some(self.max_offset),
            horizon_ms: (!self.every_tick).then_some(self.horizon_ms),
        }
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let ticks = read_ticks(&self.ticks)?;
        let labels = label_outcomes(&ticks, self.pl_limit, self.spread_delta);
        let out = output_writer(self.output.as_deref())?;

        let written = if self.training {
            let extractor = FeatureExtractor::new(
                &config.windows,
                config.features.incomplete,
                config.instrument.normalize_to,
            );
            let rows = training_rows(
                &ticks,
                &labels,
                &extractor,
                config.history.capacity,
                &self.filter(config),
            );
            // headerless, as loaded by the KNN classifier
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(out);
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            rows.len()
        } else {
            let mut writer = csv::Writer::from_writer(out);
            for label in &labels {
                writer.serialize(label)?;
            }
            writer.flush()?;
            labels.len()
        };

        tracing::info!(
            ticks = ticks.len(),
            written,
            pl_limit = self.pl_limit,
            training = self.training,
            "Labels written"
        );
        Ok(())
    }
}
