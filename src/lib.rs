pub mod cli;
pub mod commands;
pub mod db;
pub mod errors;
pub mod export;
pub mod ingestion;
pub mod metrics;
pub mod scrape;
pub mod settings;
mod utils;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use db::Database;
use export::write_metrics_csv;
use ingestion::CycleReport;
use log::warn;
use metrics::ShopMetrics;
use settings::{Settings, SettingsStore};

/// Everything a command needs, created once by the entry point.
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_metrics_table(rows: &[ShopMetrics]) {
    println!(
        "{:<32} {:>12} {:>8} {:>10} {:>10}",
        "Shop", "Latest", "Today", "7-Day", "30-Day"
    );
    for row in rows {
        let m = &row.metrics;
        println!(
            "{:<32} {:>12} {:>+8} {:>10} {:>10}",
            row.shop.name, m.latest, m.diff, m.last7, m.last30
        );
    }
}

/// One compact JSON line per finished cycle.
fn write_report_line<W: Write>(out: &mut W, report: &CycleReport) -> Result<()> {
    let line = serde_json::to_string(report).context("failed to serialize cycle report")?;
    writeln!(out, "{line}").context("failed to write cycle report")?;
    out.flush().context("failed to flush cycle report")
}

pub async fn run() -> Result<()> {
    // Honour RUST_LOG, default to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = SettingsStore::new(cli.config.clone())?;

    if let Command::Config(args) = &cli.command {
        let settings = commands::configure(&store, args)?;
        return print_json(&settings);
    }

    let mut settings = store.settings().with_env_overrides();
    if let Some(path) = cli.db {
        settings.database_path = path;
    }

    log::info!("shopwatch starting (db: {})", settings.database_path.display());

    let state = AppState {
        db: Database::new(settings.database_path.clone())?,
        settings,
    };

    match cli.command {
        Command::AddShop { name } => print_json(&commands::add_shop(&state, &name).await?),
        Command::Shops => print_json(&commands::list_shops(&state).await?),
        Command::Scrape => print_json(&commands::scrape_once(&state).await?),
        Command::Stats(args) => {
            let rows = commands::shop_stats(&state, args.policy, args.shop.as_deref()).await?;
            if args.json {
                print_json(&rows)
            } else if args.csv {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                write_metrics_csv(&mut lock, &rows).context("failed to write metrics")
            } else {
                let policy = args.policy.unwrap_or(state.settings.delta_policy);
                log::info!("window sums use the {} delta policy", policy.as_str());
                print_metrics_table(&rows);
                Ok(())
            }
        }
        Command::Export(args) => {
            let written = commands::export_history(&state, &args.out).await?;
            println!("Wrote {written} rows to {}", args.out.display());
            Ok(())
        }
        Command::Watch(args) => {
            commands::watch(&state, args.interval_secs, |report| {
                if let Err(err) = write_report_line(&mut io::stdout(), report) {
                    warn!("cycle {}: {err:#}", report.cycle_id);
                }
            })
            .await
        }
        Command::Config(_) => Ok(()),
    }
}
