//! CLI interface for tickfit
//!
//! Provides subcommands for:
//! - `replay`: Run the decision engine over recorded ticks
//! - `follow`: Execute published signals while replaying ticks
//! - `features`: Emit per-tick feature records
//! - `label`: Emit outcome labels or KNN training rows
//! - `config`: Show effective configuration

mod features;
mod follow;
mod label;
mod replay;

pub use features::FeaturesArgs;
pub use follow::FollowArgs;
pub use label::LabelArgs;
pub use replay::ReplayArgs;

use crate::config::{Config, ExecutionMode};
use crate::engine::Trader;
use crate::execution::{OrderVenue, PaperVenue, SignalVenue};
use crate::position::PositionBook;
use crate::risk::LotSizer;
use crate::signal::FileChannel;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "tickfit")]
#[command(about = "Tick-level feature extraction and trade decision engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the decision engine over a recorded tick file
    Replay(ReplayArgs),
    /// Execute signal artifacts while replaying ticks
    Follow(FollowArgs),
    /// Emit per-tick feature records
    Features(FeaturesArgs),
    /// Emit outcome labels or training rows
    Label(LabelArgs),
    /// Show effective configuration
    Config,
}

/// Paper venue seeded from configuration
fn paper_venue(config: &Config) -> PaperVenue {
    PaperVenue::new(
        config.execution.initial_balance,
        config.instrument.price_scale,
        config.sizing.contract_size,
    )
}

/// Signal channel in the configured directory
async fn file_channel(config: &Config) -> anyhow::Result<FileChannel> {
    Ok(FileChannel::new(&config.signal.dir, config.signal.max_age()).await?)
}

/// Venue for the configured execution mode
async fn venue(config: &Config) -> anyhow::Result<Arc<dyn OrderVenue>> {
    Ok(match config.execution.mode {
        ExecutionMode::Paper => Arc::new(paper_venue(config)),
        ExecutionMode::Signal => {
            let channel = file_channel(config).await?;
            tracing::info!(dir = %config.signal.dir.display(), "Publishing signals");
            Arc::new(SignalVenue::new(
                Arc::new(channel),
                config.execution.initial_balance,
            ))
        }
    })
}

fn trader(config: &Config, book: PositionBook, venue: Arc<dyn OrderVenue>) -> Trader {
    Trader::new(
        book,
        LotSizer::from_config(&config.sizing),
        venue,
        config.instrument.price_scale,
    )
}

/// A file when given, stdout otherwise
fn output_writer(path: Option<&Path>) -> anyhow::Result<Box<dyn Write + Send>> {
    Ok(match path {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "tickfit",
            "--config",
            "custom.toml",
            "replay",
            "--ticks",
            "ticks.csv",
            "--no-record",
        ])
        .unwrap();
        assert_eq!(cli.config, "custom.toml");
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(args.ticks, Path::new("ticks.csv"));
        assert!(args.no_record);
    }

    #[test]
    fn test_parse_label_defaults() {
        let cli = Cli::try_parse_from(["tickfit", "label", "--ticks", "ticks.csv"]).unwrap();
        let Commands::Label(args) = cli.command else {
            panic!("expected label");
        };
        assert_eq!(args.pl_limit, 30);
        assert_eq!(args.spread_delta, 0);
        assert!(!args.training);
    }

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(["tickfit", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
        assert_eq!(cli.config, "config.toml");
    }
}
