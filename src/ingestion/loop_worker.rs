use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{db::Database, scrape::SalesSource};

use super::cycle::{run_cycle, CycleOptions, CycleReport};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Run an ingestion cycle on every tick until cancelled. The first cycle
/// starts immediately; a cycle in flight always runs to completion.
pub async fn scrape_loop<S: SalesSource>(
    db: Database,
    source: Arc<S>,
    options: CycleOptions,
    every: Duration,
    reports: watch::Sender<Option<CycleReport>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_cycle(&db, source.as_ref(), &options).await {
                    Ok(report) => {
                        reports.send_replace(Some(report));
                    }
                    Err(err) => log_error!("scrape cycle failed: {err:?}"),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("scrape loop shutting down");
                break;
            }
        }
    }
}
