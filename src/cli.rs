use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::metrics::DeltaPolicy;

/// shopwatch - track competitor storefront sales over time
#[derive(Parser, Debug)]
#[command(name = "shopwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the settings file (created by `config` when missing)
    #[arg(short, long, global = true, default_value = "shopwatch.json")]
    pub config: PathBuf,

    /// Database file. Overrides the settings file and SHOPWATCH_DB.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start tracking a shop by its storefront name
    AddShop { name: String },

    /// Dump tracked shops and every stored snapshot as JSON
    Shops,

    /// Run one scrape cycle over every tracked shop
    Scrape,

    /// Latest sales, day-over-day change and rolling 7/30 snapshot volume
    Stats(StatsArgs),

    /// Write the full sales history as CSV
    Export(ExportArgs),

    /// Scrape on a fixed interval until interrupted
    Watch(WatchArgs),

    /// Show or change persisted settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Print CSV instead of a table
    #[arg(long, conflicts_with = "json")]
    pub csv: bool,

    /// Override how counter decreases are counted
    #[arg(long, value_enum)]
    pub policy: Option<DeltaPolicy>,

    /// Only report this shop
    #[arg(long)]
    pub shop: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file
    #[arg(short, long, default_value = "sales_history.csv")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between cycles. Defaults to the configured interval.
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[arg(long, value_enum)]
    pub delta_policy: Option<DeltaPolicy>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub interval_secs: Option<u64>,

    #[arg(long)]
    pub request_delay_ms: Option<u64>,

    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    #[arg(long)]
    pub database_path: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn is_empty(&self) -> bool {
        self.delta_policy.is_none()
            && self.base_url.is_none()
            && self.interval_secs.is_none()
            && self.request_delay_ms.is_none()
            && self.request_timeout_secs.is_none()
            && self.database_path.is_none()
    }
}
