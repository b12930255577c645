//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hostpulse_core::monitoring::TransportKind;

/// Live CPU, memory, disk and network telemetry for hosts reached over SSH
#[derive(Parser)]
#[command(name = "hostpulse")]
#[command(author, version, about = "hostpulse remote host telemetry")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "HOSTPULSE_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Poll a host and print every snapshot
    #[command(about = "Poll a host and print each telemetry snapshot")]
    Watch {
        /// Saved profile name (see `profiles`)
        #[arg(conflicts_with = "host")]
        profile: Option<String>,

        /// Ad-hoc host (hostname or IP) instead of a profile
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// SSH username for an ad-hoc host
        #[arg(short, long, requires = "host")]
        user: Option<String>,

        /// SSH port for an ad-hoc host
        #[arg(short, long, requires = "host")]
        port: Option<u16>,

        /// SSH private key for an ad-hoc host
        #[arg(short, long, requires = "host")]
        identity: Option<PathBuf>,

        /// Jump host (`[user@]host[:port]`); selects the bastion transport
        #[arg(short = 'J', long, requires = "host")]
        jump: Option<String>,

        /// Snapshot output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: SnapshotFormat,

        /// Stop after this many snapshots
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Override the polling interval (milliseconds, clamped to 1000-20000)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },

    /// Parse captured command output offline
    #[command(about = "Parse a captured command output file and print the snapshot")]
    Parse {
        /// Transport whose output format the file uses
        #[arg(short, long, value_enum)]
        transport: TransportArg,

        /// File with the captured output (`-` for stdin)
        #[arg(short, long)]
        file: PathBuf,

        /// Configured host, reported as IP when none is found
        #[arg(short = 'H', long, default_value = "localhost")]
        host: String,
    },

    /// Print the commands run on the remote host
    #[command(about = "Print the shell commands issued on every poll")]
    Commands {
        /// Transport to show the commands for
        #[arg(short, long, value_enum, default_value = "direct")]
        transport: TransportArg,
    },

    /// List saved connection profiles
    #[command(about = "List connection profiles from config.toml")]
    Profiles {
        /// Output format
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Transport selection on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TransportArg {
    /// Session straight to the host
    Direct,
    /// Session through a jump host
    Bastion,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::Direct => Self::Direct,
            TransportArg::Bastion => Self::Bastion,
        }
    }
}

/// Snapshot output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SnapshotFormat {
    /// One human-readable line per snapshot
    Text,
    /// One JSON object per line
    Json,
}

/// Table output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}
