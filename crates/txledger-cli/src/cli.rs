use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use txledger_core::{Selection, VERSION};

/// txledger - per-customer transaction ledgers kept as nested collections
#[derive(Parser)]
#[command(name = "txledger")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the ledger database
    #[arg(long, global = true, env = "TXLEDGER_DB")]
    pub db: Option<PathBuf>,

    /// Customer to operate on (repeatable; overrides the config file)
    #[arg(short, long = "customer", global = true, value_name = "NAME")]
    pub customers: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remove each customer's ledger entirely
    Drop,

    /// Empty each customer's ledger, keeping its retention marker
    Clear,

    /// Append a generated batch of transactions to each ledger
    Load(LoadArgs),

    /// Add a delta to a value inside one transaction
    Modify(ModifyArgs),

    /// Remove transactions older than a retention window
    Expire(ExpireArgs),

    /// Show ledger size, marker and totals
    Info(InfoArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `load` command
#[derive(Args)]
pub struct LoadArgs {
    /// Number of transactions per customer
    #[arg(long, default_value_t = 10)]
    pub count: usize,

    /// Id of the oldest transaction; newer ones count down from it
    #[arg(long, default_value_t = 1_000)]
    pub base_id: i64,

    /// Timestamp (epoch seconds) of the oldest transaction
    #[arg(long, allow_hyphen_values = true)]
    pub start_ts: Option<f64>,

    /// Seconds between consecutive transactions
    #[arg(long, default_value_t = 60.0)]
    pub interval: f64,

    /// Amount of every generated transaction
    #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
    pub amount: i64,

    /// Value shape (flat, list, map); defaults to the configured shape
    #[arg(long)]
    pub shape: Option<String>,

    /// Lowest id future expirations may mint
    #[arg(long)]
    pub floor: Option<i64>,
}

/// Arguments for the `modify` command
#[derive(Args)]
pub struct ModifyArgs {
    /// Transaction id
    #[arg(long)]
    pub id: i64,

    /// Amount to add (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    pub delta: i64,

    /// Upper bound for the new value
    #[arg(long, default_value_t = i64::MAX, allow_hyphen_values = true)]
    pub clamp: i64,

    /// Path to the value inside the transaction (e.g. "1", "amount", "splits/=4")
    #[arg(long)]
    pub path: Option<String>,

    /// Which matches of the path to modify
    #[arg(long, value_enum, default_value_t = SelectArg::Unique)]
    pub select: SelectArg,
}

/// Arguments for the `expire` command
#[derive(Args)]
pub struct ExpireArgs {
    /// Retention window (e.g., "7d", "24h", "90s")
    #[arg(long)]
    pub window: String,

    /// Reference time in epoch seconds (defaults to now)
    #[arg(long)]
    pub now: Option<f64>,

    /// Path to the ordering key inside each transaction
    #[arg(long)]
    pub key_path: Option<String>,
}

/// Arguments for the `info` command
#[derive(Args)]
pub struct InfoArgs {
    /// Also list the first N entries of each ledger
    #[arg(long, value_name = "N")]
    pub entries: Option<usize>,

    /// Path of the values to aggregate (defaults to the amount)
    #[arg(long)]
    pub path: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SelectArg {
    First,
    All,
    Unique,
}

impl From<SelectArg> for Selection {
    fn from(arg: SelectArg) -> Self {
        match arg {
            SelectArg::First => Selection::First,
            SelectArg::All => Selection::All,
            SelectArg::Unique => Selection::Unique,
        }
    }
}
