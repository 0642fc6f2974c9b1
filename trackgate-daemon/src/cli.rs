//! CLI argument definitions for trackgate-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Trackgate detection ingestion daemon.
///
/// Subscribes to an MQTT broker, normalizes DeepStream-style
/// detection payloads, and fans them out to the configured sinks.
#[derive(Parser, Debug)]
#[command(name = "trackgate-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to trackgate.toml configuration file.
    #[arg(short, long, default_value = "/etc/trackgate/trackgate.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
