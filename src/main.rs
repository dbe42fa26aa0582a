use clap::Parser;
use tickfit::cli::{Cli, Commands};
use tickfit::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration; a missing file falls back to the shipped example,
    // an invalid one is fatal
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        let config: Config = toml::from_str(include_str!("../config.toml.example"))?;
        config.validate()?;
        config
    };

    // Initialize telemetry
    tickfit::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Replay(args) => {
            tracing::info!("Starting replay");
            args.execute(&config).await?;
        }
        Commands::Follow(args) => {
            tracing::info!("Starting signal follower");
            args.execute(&config).await?;
        }
        Commands::Features(args) => {
            args.execute(&config).await?;
        }
        Commands::Label(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
