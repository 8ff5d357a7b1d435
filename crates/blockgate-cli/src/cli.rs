use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::BackendKind;

#[derive(Parser)]
#[command(
    name = "blockgate",
    about = "Content-addressed block storage over an embedded key-value store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML). Defaults to ./blockgate.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the filesystem backend's data.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the store and print the versioned base locator
    Start(LocatorArgs),
    /// Write a block
    Put(PutArgs),
    /// Read a block
    Get(GetArgs),
    /// Remove a block
    Delete(KeyArgs),
    /// Erase every block of the logical database
    Destroy(LocatorArgs),
    /// Read or write key bag records
    Keybag(KeybagArgs),
    /// List registered protocols
    Protocols,
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct LocatorArgs {
    /// Base locator; defaults to the configured one
    #[arg(long)]
    pub locator: Option<String>,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
    #[command(flatten)]
    pub base: LocatorArgs,
}

#[derive(Args)]
pub struct PutArgs {
    pub key: String,
    /// Block contents as UTF-8 text
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub value: Option<String>,
    /// Read block contents from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub base: LocatorArgs,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Write the block to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[command(flatten)]
    pub base: LocatorArgs,
}

#[derive(Args)]
pub struct KeybagArgs {
    #[command(subcommand)]
    pub action: KeybagAction,
}

#[derive(Subcommand)]
pub enum KeybagAction {
    /// Show the record stored under an id
    Get {
        id: String,
        /// Key bag locator; defaults to kv:// (namespace "keybag")
        #[arg(long)]
        locator: Option<String>,
    },
    /// Store a record under an id
    Set {
        id: String,
        name: String,
        key: String,
        #[arg(long)]
        locator: Option<String>,
    },
}
