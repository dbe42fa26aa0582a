//! Replay command implementation

use super::{file_channel, trader, venue};
use crate::config::Config;
use crate::data::CsvRecorder;
use crate::engine::{build_strategy, Engine, TickHandler};
use crate::feed::ReplayFeed;
use crate::position::PositionBook;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Recorded tick file (`time,ask,bid` rows)
    #[arg(short, long)]
    pub ticks: PathBuf,

    /// Output directory for records (defaults to data.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write tick or order records
    #[arg(long)]
    pub no_record: bool,
}

impl ReplayArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let feed = ReplayFeed::from_file(&self.ticks)?;
        tracing::info!(
            ticks = feed.len(),
            symbol = %config.instrument.symbol,
            mode = ?config.execution.mode,
            "Replaying {:?}",
            self.ticks
        );

        let strategy = build_strategy(config)?;
        let venue = venue(config).await?;
        let mut trader = trader(config, PositionBook::new(Some(config.close.policy())), venue);
        if !self.no_record {
            let dir = self.output.as_ref().unwrap_or(&config.data.output_dir);
            trader = trader.with_recorder(Box::new(CsvRecorder::create(
                dir,
                config.data.record_ticks,
            )?));
        }

        let mut engine = Engine::new(config, strategy, trader);
        if config.signal.inbox {
            engine = engine.with_inbox(Arc::new(file_channel(config).await?));
        }

        let summary = engine.run(&feed).await?;
        println!("{}", summary.format_table());
        Ok(())
    }
}
