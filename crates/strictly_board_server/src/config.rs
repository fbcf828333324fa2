//! Server configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a TOML
//! file, `STRICTLY_BOARD_*` environment variables, then command-line flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable overriding the bind host.
pub const HOST_VAR: &str = "STRICTLY_BOARD_HOST";
/// Environment variable overriding the bind port.
pub const PORT_VAR: &str = "STRICTLY_BOARD_PORT";

/// Configuration for the game server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// Players required before a session may start.
    #[serde(default = "default_min_players")]
    min_players: usize,

    /// Documents queued per subscriber before it is evicted.
    #[serde(default = "default_listener_capacity")]
    listener_capacity: usize,

    /// Seed for reproducible dice. Entropy when absent.
    #[serde(default)]
    dice_seed: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_min_players() -> usize {
    2
}

fn default_listener_capacity() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            min_players: default_min_players(),
            listener_capacity: default_listener_capacity(),
            dice_seed: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies host and port overrides from the process environment.
    #[instrument(skip(self))]
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// Applies host and port overrides read through `lookup`.
    pub fn with_vars(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup(HOST_VAR) {
            debug!(%host, "Host overridden from environment");
            self.host = host;
        }
        if let Some(port) = lookup(PORT_VAR) {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid {}: {}", PORT_VAR, e)))?;
            debug!(port = self.port, "Port overridden from environment");
        }
        Ok(self)
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the minimum player count.
    pub fn with_min_players(mut self, min_players: usize) -> Self {
        self.min_players = min_players;
        self
    }

    /// Fixes the dice seed.
    pub fn with_dice_seed(mut self, seed: u64) -> Self {
        self.dice_seed = Some(seed);
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Fails if `min_players` is outside `1..=MAX_PLAYERS` or
    /// `listener_capacity` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=strictly_board::MAX_PLAYERS).contains(&self.min_players) {
            return Err(ConfigError::new(format!(
                "min_players must be between 1 and {}, got {}",
                strictly_board::MAX_PLAYERS,
                self.min_players
            )));
        }
        if self.listener_capacity == 0 {
            return Err(ConfigError::new("listener_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error at the caller's location.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
