//! Command-line interface for the strictly_board server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Board - multiplayer session engine for a dice-and-move board game
#[derive(Parser, Debug)]
#[command(name = "strictly_board")]
#[command(about = "Game session server with REST and SSE interface", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config and environment)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and environment)
        #[arg(short, long)]
        port: Option<u16>,

        /// Players required to start a session
        #[arg(long)]
        min_players: Option<usize>,

        /// Seed for reproducible dice
        #[arg(long)]
        dice_seed: Option<u64>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
