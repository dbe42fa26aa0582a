//! Features command implementation

use super::output_writer;
use crate::config::Config;
use crate::data::{CsvRecorder, Recorder, TickRecord};
use crate::feature::FeatureExtractor;
use crate::feed::read_ticks;
use crate::history::RingBuffer;
use crate::risk::MovementGate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Recorded tick file (`time,ask,bid` rows)
    #[arg(short, long)]
    pub ticks: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FeaturesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let ticks = read_ticks(&self.ticks)?;
        let extractor = FeatureExtractor::new(
            &config.windows,
            config.features.incomplete,
            config.instrument.normalize_to,
        );
        let mut movement = MovementGate::new(
            config.gates.movement_window_ms,
            config.gates.movement_threshold,
            config.gates.movement_wait_ms,
            config.instrument.normalize_to,
        );
        let mut ring = RingBuffer::new(config.history.capacity);
        let mut recorder = CsvRecorder::new(Some(output_writer(self.output.as_deref())?), None);

        for tick in &ticks {
            let index = ring.append(tick.time, tick.ask);
            let moved = movement.update(tick);
            let features = extractor.extract(&ring, index);
            recorder.record_tick(&TickRecord::new(tick, &features, moved))?;
        }
        recorder.flush()?;

        tracing::info!(
            ticks = ticks.len(),
            windows = config.windows.len(),
            "Feature records written"
        );
        Ok(())
    }
}
