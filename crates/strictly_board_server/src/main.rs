//! Strictly Board - server binary.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use strictly_board_server::{GameEngine, ServerConfig, router};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,strictly_board=debug,strictly_board_server=debug";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            min_players,
            dice_seed,
        } => {
            let mut config = load_config(config)?;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            if let Some(min_players) = min_players {
                config = config.with_min_players(min_players);
            }
            if let Some(seed) = dice_seed {
                config = config.with_dice_seed(seed);
            }
            config.validate()?;
            run_server(config).await
        }
        Command::Config { config } => {
            let config = load_config(config)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Defaults or file, then environment overrides.
#[instrument]
fn load_config(path: Option<PathBuf>) -> Result<ServerConfig> {
    let config = match path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    Ok(config.with_env()?)
}

/// Run the HTTP game server
#[instrument(skip(config), fields(address = %config.bind_address()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let engine = GameEngine::from_config(&config);
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(
        min_players = config.min_players(),
        listener_capacity = config.listener_capacity(),
        "Server ready at http://{}/",
        config.bind_address()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
