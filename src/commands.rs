use std::{fs::File, io::BufWriter, path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use log::info;
use tokio::time::Duration;

use crate::{
    cli::ConfigArgs,
    db::RegisteredShop,
    export::{write_history_csv, ShopsListing},
    ingestion::{run_cycle, CycleOptions, CycleReport, ScrapeController},
    metrics::{metrics_for_all_shops, metrics_for_shop, DeltaPolicy, ShopMetrics},
    scrape::HttpSalesSource,
    settings::{Settings, SettingsStore},
    AppState,
};

fn http_source(settings: &Settings) -> Result<HttpSalesSource> {
    HttpSalesSource::new(
        &settings.base_url,
        &settings.user_agent,
        settings.request_timeout(),
    )
}

fn cycle_options(settings: &Settings) -> CycleOptions {
    CycleOptions {
        request_delay: settings.request_delay(),
    }
}

pub async fn add_shop(state: &AppState, name: &str) -> Result<RegisteredShop> {
    let registered = state.db.register_shop(name).await?;
    if registered.created {
        info!("Tracking new shop {} (id {})", registered.name, registered.id);
    } else {
        info!("Shop {} is already tracked", registered.name);
    }
    Ok(registered)
}

pub async fn list_shops(state: &AppState) -> Result<ShopsListing> {
    let shops = state.db.list_shops().await?;
    let pairs = state.db.list_all_snapshots().await?;
    Ok(ShopsListing::new(shops, pairs))
}

pub async fn scrape_once(state: &AppState) -> Result<CycleReport> {
    let source = http_source(&state.settings)?;
    run_cycle(&state.db, &source, &cycle_options(&state.settings)).await
}

/// Metrics for every shop, or only for `shop_name` when given.
pub async fn shop_stats(
    state: &AppState,
    policy: Option<DeltaPolicy>,
    shop_name: Option<&str>,
) -> Result<Vec<ShopMetrics>> {
    let policy = policy.unwrap_or(state.settings.delta_policy);

    let Some(name) = shop_name else {
        return metrics_for_all_shops(&state.db, policy).await;
    };

    let shop = state
        .db
        .get_shop_by_name(name)
        .await?
        .ok_or_else(|| anyhow!("shop {} is not tracked", name.trim()))?;
    let metrics = metrics_for_shop(&state.db, shop.id, policy).await?;
    Ok(vec![ShopMetrics { shop, metrics }])
}

/// Write the history CSV and return how many snapshot rows it holds.
pub async fn export_history(state: &AppState, out: &Path) -> Result<usize> {
    let rows = state.db.list_all_snapshots().await?;
    let file =
        File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    write_history_csv(&mut writer, &rows)
        .with_context(|| format!("failed to write {}", out.display()))?;
    Ok(rows.len())
}

/// Run the scrape loop until Ctrl-C, handing every finished cycle to
/// `on_report`.
pub async fn watch<F>(state: &AppState, interval_secs: Option<u64>, mut on_report: F) -> Result<()>
where
    F: FnMut(&CycleReport),
{
    let every = interval_secs
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| state.settings.scrape_interval());

    let source = Arc::new(http_source(&state.settings)?);
    let mut controller = ScrapeController::new();
    let mut reports = controller.subscribe();
    controller.start(
        state.db.clone(),
        source,
        cycle_options(&state.settings),
        every,
    )?;

    loop {
        tokio::select! {
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(report) = reports.borrow_and_update().as_ref() {
                    on_report(report);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping scrape loop");
                break;
            }
        }
    }

    controller.stop().await
}

/// Apply any provided overrides to the stored settings and return the result.
pub fn configure(store: &SettingsStore, args: &ConfigArgs) -> Result<Settings> {
    let mut settings = store.settings();
    if args.is_empty() {
        return Ok(settings);
    }

    if let Some(policy) = args.delta_policy {
        settings.delta_policy = policy;
    }
    if let Some(url) = &args.base_url {
        settings.base_url = url.clone();
    }
    if let Some(secs) = args.interval_secs {
        settings.scrape_interval_secs = secs;
    }
    if let Some(ms) = args.request_delay_ms {
        settings.request_delay_ms = ms;
    }
    if let Some(secs) = args.request_timeout_secs {
        settings.request_timeout_secs = secs;
    }
    if let Some(path) = &args.database_path {
        settings.database_path = path.clone();
    }

    store.update(settings.clone())?;
    Ok(settings)
}
