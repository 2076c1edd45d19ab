//! Configuration and CLI argument handling

use clap::Parser;
use std::{path::PathBuf, time::Duration};

use crate::storage::default_data_dir;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "timer-tracker")]
#[command(about = "A state-managed countdown timer tracker with persisted history")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding timers.json and history.json
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Keep state in memory only; nothing survives a restart
    #[arg(long)]
    pub ephemeral: bool,

    /// Countdown tick interval in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Directory used for file storage
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
