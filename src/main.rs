//! autopower daemon - switches system power following MPRIS playback.

use std::{error::Error, path::PathBuf};

use autopower::{
    config::{Config, ConfigPaths, LogLevel},
    power::PowerController,
    services::{BusKind, SourceError, SourceKind, gmrender::GmrenderSource, mpris::MprisSource},
    tracing_config,
};
use clap::{Parser, Subcommand};
use tokio::signal::{
    self,
    unix::{SignalKind, signal},
};
use tracing::{Level, info, span};

#[derive(Parser)]
#[command(name = "autopower", version)]
#[command(about = "Automate system power by subscribing to MPRIS or gmrender-resurrect D-Bus signals")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file to use instead of the default location.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable system power when paused for this duration (seconds).
    #[arg(long, global = true, allow_negative_numbers = true)]
    pause_timeout: Option<f64>,

    /// Disable system power when stopped for this duration (seconds).
    #[arg(long, global = true, allow_negative_numbers = true)]
    stop_timeout: Option<f64>,

    /// Bus to watch for players.
    #[arg(long, global = true, value_enum)]
    bus: Option<BusKind>,

    /// Kind of player to follow.
    #[arg(long, global = true, value_enum)]
    source: Option<SourceKind>,

    /// Monitor a specific gmrender-resurrect instance given by the UUID.
    #[arg(long, global = true)]
    uuid: Option<String>,

    /// Only log power changes instead of running the configured commands.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable debug messages.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Watch players and control power (default)
    Run,
    /// Validate the configuration and print the effective values
    CheckConfig,
    /// Print the JSON schema of the configuration file
    Schema,
    /// List MPRIS players on the bus and exit
    ListPlayers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    if let Commands::Schema = command {
        let schema = schemars::schema_for!(Config);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let config = load_config(&cli)?;

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        config.general.log_level
    };
    let _log_guard = tracing_config::init(
        level,
        config.general.log_format,
        config.general.log_to_file && matches!(command, Commands::Run),
    )?;

    match command {
        Commands::Run => run(config, cli.dry_run).await,
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::ListPlayers => list_players(config.source.bus).await,
        Commands::Schema => Ok(()),
    }
}

/// Loads the configuration file and applies command line overrides.
///
/// # Errors
/// Returns error if the file cannot be read or the result fails validation.
fn load_config(cli: &Cli) -> Result<Config, Box<dyn Error>> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => ConfigPaths::main_config()?,
    };

    let mut config = Config::load(&path)?;

    if let Some(secs) = cli.pause_timeout {
        config.power.pause_timeout = secs;
    }
    if let Some(secs) = cli.stop_timeout {
        config.power.stop_timeout = secs;
    }
    if let Some(bus) = cli.bus {
        config.source.bus = bus;
    }
    if let Some(kind) = cli.source {
        config.source.kind = kind;
    }
    if let Some(uuid) = &cli.uuid {
        config.source.uuid = Some(uuid.clone());
    }

    config.validate()?;
    Ok(config)
}

async fn run(config: Config, dry_run: bool) -> Result<(), Box<dyn Error>> {
    let _span = span!(Level::INFO, "autopower").entered();
    info!("Starting autopower");

    let controller = PowerController::spawn(
        config.power.debounce()?,
        config.actions.build(dry_run)?,
        config.power.timer.build(),
    );

    let source = &config.source;
    let result = match source.kind {
        SourceKind::Mpris => {
            let mpris = MprisSource::connect(
                source.bus,
                controller.clone(),
                source.ignored_players.clone(),
            )
            .await?;
            let result = until_terminated(mpris.run()).await;
            mpris.shutdown().await;
            result
        }
        SourceKind::Gmrender => {
            let gmrender =
                GmrenderSource::connect(source.bus, controller.clone(), source.uuid.clone())
                    .await?;
            until_terminated(gmrender.run()).await
        }
    };

    controller.shutdown().await;
    result
}

/// Drives a source until it ends or the process is asked to stop.
async fn until_terminated(
    source: impl Future<Output = Result<(), SourceError>>,
) -> Result<(), Box<dyn Error>> {
    let mut terminate = signal(SignalKind::terminate())?;

    let result = tokio::select! {
        result = source => result,
        _ = signal::ctrl_c() => Ok(()),
        _ = terminate.recv() => Ok(()),
    };

    info!("Shutting down");
    Ok(result?)
}

async fn list_players(bus: BusKind) -> Result<(), Box<dyn Error>> {
    let connection = bus.connect().await?;
    let players = MprisSource::list_players(&connection).await?;

    if players.is_empty() {
        println!("No MPRIS players on the {bus} bus");
        return Ok(());
    }

    println!("MPRIS players on the {bus} bus:");
    for player in players {
        println!("  - {} ({}): {}", player.identity, player.id, player.status);
    }

    Ok(())
}
