//! CLI arguments and subcommands for gpfs-exporter.
//!
//! This module defines the static part of the command-line interface. The
//! per-collector `--collector.<name>` switches are added at runtime by
//! [`CollectorRegistry::augment_args`](gpfs_exporter::CollectorRegistry::augment_args).

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use gpfs_exporter::CollectorRegistry;
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "gpfs-exporter",
    about = "Prometheus exporter for GPFS / IBM Spectrum Scale",
    long_about = "Prometheus exporter for GPFS / IBM Spectrum Scale.\n\n\
                  Runs the GPFS administrative commands (mmgetstate, mmlsfs, mmfsadm) on every \
                  scrape, parses their output and exposes the results as Prometheus metrics. \
                  Each collector can be switched on or off with --collector.<name> and \
                  --no-collector.<name>.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides `log_level` from the config file; default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Directory containing the GPFS mm* binaries
    #[arg(long)]
    pub mmfs_bin_dir: Option<PathBuf>,

    /// Run GPFS commands directly instead of through sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Mount table consulted by the mount collector
    #[arg(long)]
    pub proc_mounts: Option<PathBuf>,

    /// Comma-separated mountpoints to check instead of asking mmlsfs
    #[arg(long = "collector.mount.mounts")]
    pub mounts: Option<String>,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

impl Args {
    /// Parses the process arguments, including the collector switches of
    /// `registry`. Returns the matches so the caller can apply them.
    pub fn parse_with(registry: &CollectorRegistry) -> (Self, ArgMatches) {
        let matches = registry.augment_args(Self::command()).get_matches();
        let args = Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
        (args, matches)
    }
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and system requirements
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run the enabled collectors and print the resulting metrics
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,
    },

    /// List registered collectors and whether they are enabled
    Collectors,
}
