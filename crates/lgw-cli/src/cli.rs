use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lgw",
    about = "LedgerGateway: asset-transfer client for permissioned ledgers",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Gateway configuration file.
    #[arg(short, long, global = true, default_value = "lgw.toml")]
    pub config: PathBuf,

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
    /// Store the application identity in the wallet, importing it from the
    /// MSP directory on first use
    Enroll(EnrollArgs),
    /// Seed the ledger with the sample assets
    InitLedger,
    /// Query and change assets
    Assets(AssetsArgs),
    /// Re-query the commit status of a transaction
    CommitStatus(CommitStatusArgs),
    /// Run the sample flow: seed, list, create, read, transfer, read
    Sample,
    /// Serve a development network
    Devnet(DevnetArgs),
}

#[derive(Args)]
pub struct EnrollArgs {
    /// Replace an identity already stored under the label.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AssetsArgs {
    #[command(subcommand)]
    pub action: AssetAction,
}

#[derive(Subcommand)]
pub enum AssetAction {
    /// List every asset
    List,
    /// Show one asset
    Read { id: String },
    /// Whether an asset exists
    Exists { id: String },
    /// Create an asset
    Create(AssetFields),
    /// Replace an existing asset
    Update(AssetFields),
    /// Give an asset to a new owner
    Transfer { id: String, new_owner: String },
    /// Remove an asset
    Delete { id: String },
}

#[derive(Args, Clone, Debug)]
pub struct AssetFields {
    pub id: String,
    pub color: String,
    pub size: i64,
    pub owner: String,
    pub appraised_value: i64,
}

#[derive(Args)]
pub struct CommitStatusArgs {
    /// Transaction id, hex.
    pub tx_id: String,
}

#[derive(Args)]
pub struct DevnetArgs {
    /// Development network configuration file.
    #[arg(long)]
    pub network: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<String>,
    /// Serve TLS with a freshly generated self-signed certificate.
    #[arg(long)]
    pub self_signed: bool,
    /// Write a connection profile for this network to the given file.
    #[arg(long)]
    pub profile_out: Option<PathBuf>,
}
