//! Follow command implementation

use super::{file_channel, paper_venue, trader};
use crate::config::Config;
use crate::data::CsvRecorder;
use crate::engine::{SignalFollower, TickHandler};
use crate::feed::ReplayFeed;
use crate::position::PositionBook;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct FollowArgs {
    /// Tick file to execute against (`time,ask,bid` rows)
    #[arg(short, long)]
    pub ticks: PathBuf,

    /// Signal directory (defaults to signal.dir)
    #[arg(long)]
    pub signals: Option<PathBuf>,

    /// Output directory for order records (defaults to data.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl FollowArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(dir) = &self.signals {
            config.signal.dir = dir.clone();
        }

        let feed = ReplayFeed::from_file(&self.ticks)?;
        let channel = file_channel(&config).await?;
        tracing::info!(
            ticks = feed.len(),
            dir = %config.signal.dir.display(),
            min_loss_cut = config.signal.min_loss_cut,
            "Following signals"
        );

        let dir = self.output.as_ref().unwrap_or(&config.data.output_dir);
        let trader = trader(
            &config,
            PositionBook::new(None),
            Arc::new(paper_venue(&config)),
        )
        .with_recorder(Box::new(CsvRecorder::create(dir, false)?));

        let mut follower =
            SignalFollower::new(Arc::new(channel), trader, config.signal.min_loss_cut);
        let summary = follower.run(&feed).await?;
        println!("{}", summary.format_table());
        Ok(())
    }
}
