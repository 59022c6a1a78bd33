mod help_text;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Detect added, modified and removed files in a directory tree
#[derive(Parser, Debug)]
#[command(name = "treediff", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything
    #[arg(short = 'C', value_name = "DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    /// Increase logging (-v for info, -vv for debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Set the log level. Takes precedence over RUST_LOG.
    #[arg(long, value_name = "LEVEL", global = true, conflicts_with = "verbose")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Flags shared by every command that scans the tree.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Manifest file [default: .treediff in the scanned directory]
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Read scan options from a TOML file; flags given here override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only track files with this extension (repeatable, e.g. --ext .txt)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Do not enter directories more than N levels below the root
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Report an added or removed directory as a single change
    #[arg(long)]
    pub coarse: bool,

    /// Report every entry as added, ignoring the manifest
    #[arg(long)]
    pub force_add_all: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record the current state of the tree for the first time
    #[command(long_about = help_text::INIT_LONG_ABOUT)]
    Init {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show what would be recorded without writing the manifest
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what changed since the manifest was last written
    #[command(long_about = help_text::STATUS_LONG_ABOUT)]
    Status {
        #[command(flatten)]
        scan: ScanArgs,

        /// Show old and new fingerprints for each changed file
        #[arg(long)]
        details: bool,
    },

    /// Record the current state of the tree in the manifest
    #[command(long_about = help_text::UPDATE_LONG_ABOUT)]
    Update {
        #[command(flatten)]
        scan: ScanArgs,

        /// Create the manifest if it does not exist yet
        #[arg(long)]
        allow_init: bool,

        /// Only proceed if the changes match this digest from status
        #[arg(long, value_name = "DIGEST")]
        digest: Option<String>,

        /// Show what would be recorded without writing the manifest
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
