use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{db::Database, scrape::SalesSource};

use super::{
    cycle::{CycleOptions, CycleReport},
    loop_worker::scrape_loop,
};

/// Owns the background scrape loop. At most one loop runs per controller.
pub struct ScrapeController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    reports: watch::Sender<Option<CycleReport>>,
}

impl Default for ScrapeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrapeController {
    pub fn new() -> Self {
        let (reports, _) = watch::channel(None);
        Self {
            handle: None,
            cancel_token: None,
            reports,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Latest finished cycle report; `None` until the first cycle completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<CycleReport>> {
        self.reports.subscribe()
    }

    pub fn start<S>(
        &mut self,
        db: Database,
        source: Arc<S>,
        options: CycleOptions,
        every: Duration,
    ) -> Result<()>
    where
        S: SalesSource + 'static,
    {
        if self.is_running() {
            bail!("scrape loop already running");
        }

        info!("Starting scrape loop (every {}s)", every.as_secs());

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(scrape_loop(
            db,
            source,
            options,
            every,
            self.reports.clone(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("scrape loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
