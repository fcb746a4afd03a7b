//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Buildy - minimal build-triggering service
///
/// Clones git repositories submitted over HTTP, runs their build and
/// tracks status and logs.
#[derive(Parser, Debug)]
#[command(name = "buildy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BUILDY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP build server
    Serve(ServeArgs),

    /// List builds left on disk
    History(HistoryArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command. Each flag overrides the config file.
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(short = 'H', long, env = "BUILDY_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "BUILDY_PORT")]
    pub port: Option<u16>,

    /// Base directory for build working directories
    #[arg(short, long, env = "BUILDY_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Maximum number of builds tracked in memory
    #[arg(long, env = "BUILDY_CAPACITY")]
    pub capacity: Option<usize>,

    /// Build command run inside each clone
    #[arg(long, env = "BUILDY_BUILD_COMMAND")]
    pub build_command: Option<String>,

    /// Kill builds running longer than this many seconds (0 = no limit)
    #[arg(long, env = "BUILDY_TIMEOUT")]
    pub timeout: Option<u64>,
}

/// Arguments for the history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Base directory to scan (defaults to the configured one)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for history command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one id per line)
    Plain,
}
