use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Duration;
use uuid::Uuid;

use crate::{
    db::{helpers::to_i64, Database, Shop},
    scrape::{SalesReading, SalesSource},
};

// Set to true to enable per-shop logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShopUpdate {
    pub shop: String,
    pub sales: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// Page loaded but carried no readable sales counter.
    NotFound,
    /// Network failure, timeout or error status.
    FetchFailed { message: String },
    /// The store refused the reading.
    Rejected { message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedShop {
    pub shop: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub updated: Vec<ShopUpdate>,
    pub skipped: Vec<SkippedShop>,
}

#[derive(Debug, Clone, Default)]
pub struct CycleOptions {
    /// Pause before every shop after the first.
    pub request_delay: Duration,
}

/// Store one scraped reading for a shop. Returns the new snapshot id, or
/// `None` when the reading was "not found" and nothing was written.
pub async fn ingest_reading(
    db: &Database,
    shop: &Shop,
    reading: SalesReading,
    observed_at: DateTime<Utc>,
) -> Result<Option<i64>> {
    let SalesReading::Count(count) = reading else {
        return Ok(None);
    };

    let snapshot_id = db
        .append_snapshot(shop.id, to_i64(count)?, observed_at)
        .await
        .with_context(|| format!("failed to store snapshot for {}", shop.name))?;
    Ok(Some(snapshot_id))
}

/// One pass over every registered shop, strictly one shop at a time.
///
/// A shop that fails to fetch, has no counter, or is rejected by the store is
/// recorded as skipped and the pass moves on. Only failing to list the shops
/// aborts the cycle.
pub async fn run_cycle<S: SalesSource>(
    db: &Database,
    source: &S,
    options: &CycleOptions,
) -> Result<CycleReport> {
    let cycle_id = Uuid::new_v4();
    let started_at = Utc::now();
    let shops = db.list_shops().await.context("failed to list shops")?;

    log_info!("cycle {cycle_id}: scraping {} shop(s)", shops.len());

    let mut updated = Vec::new();
    let mut skipped = Vec::new();

    for (index, shop) in shops.iter().enumerate() {
        if index > 0 && !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }

        let reason = match source.fetch_sales(&shop.name).await {
            Err(err) => {
                log_warn!("cycle {cycle_id}: fetch failed for {}: {err}", shop.name);
                SkipReason::FetchFailed {
                    message: err.to_string(),
                }
            }
            Ok(reading) => match ingest_reading(db, shop, reading, Utc::now()).await {
                Ok(Some(_)) => {
                    if let SalesReading::Count(sales) = reading {
                        updated.push(ShopUpdate {
                            shop: shop.name.clone(),
                            sales,
                        });
                    }
                    continue;
                }
                Ok(None) => {
                    log_warn!("cycle {cycle_id}: no sales counter found for {}", shop.name);
                    SkipReason::NotFound
                }
                Err(err) => {
                    log_error!("cycle {cycle_id}: {err:#}");
                    SkipReason::Rejected {
                        message: format!("{err:#}"),
                    }
                }
            },
        };

        skipped.push(SkippedShop {
            shop: shop.name.clone(),
            reason,
        });
    }

    let finished_at = Utc::now();
    log_info!(
        "cycle {cycle_id}: {} updated, {} skipped in {}ms",
        updated.len(),
        skipped.len(),
        (finished_at - started_at).num_milliseconds()
    );

    Ok(CycleReport {
        cycle_id,
        started_at,
        finished_at,
        updated,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned answers per shop name; records the order of requests.
    struct ScriptedSource {
        answers: HashMap<&'static str, Result<SalesReading, u16>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(answers: Vec<(&'static str, Result<SalesReading, u16>)>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SalesSource for ScriptedSource {
        async fn fetch_sales(&self, shop_name: &str) -> Result<SalesReading, FetchError> {
            self.calls.lock().unwrap().push(shop_name.to_string());
            match self.answers.get(shop_name) {
                Some(Ok(reading)) => Ok(*reading),
                Some(Err(status)) => Err(FetchError::Status(*status)),
                None => Err(FetchError::Network("connection refused".into())),
            }
        }
    }

    #[tokio::test]
    async fn not_found_shop_is_skipped_and_others_update() {
        let db = Database::open_in_memory().unwrap();
        let a = db.register_shop("A").await.unwrap();
        let c = db.register_shop("C").await.unwrap();
        let d = db.register_shop("D").await.unwrap();

        let source = ScriptedSource::new(vec![
            ("A", Ok(SalesReading::Count(120))),
            ("C", Ok(SalesReading::NotFound)),
            ("D", Ok(SalesReading::Count(7))),
        ]);

        let report = run_cycle(&db, &source, &CycleOptions::default()).await.unwrap();

        assert_eq!(
            report.updated,
            vec![
                ShopUpdate { shop: "A".into(), sales: 120 },
                ShopUpdate { shop: "D".into(), sales: 7 },
            ]
        );
        assert_eq!(
            report.skipped,
            vec![SkippedShop { shop: "C".into(), reason: SkipReason::NotFound }]
        );

        assert_eq!(db.list_snapshots_by_shop(a.id).await.unwrap().len(), 1);
        assert!(db.list_snapshots_by_shop(c.id).await.unwrap().is_empty());
        assert_eq!(db.list_snapshots_by_shop(d.id).await.unwrap()[0].total_sales, 7);
    }

    #[tokio::test]
    async fn fetch_failures_do_not_stop_the_cycle() {
        let db = Database::open_in_memory().unwrap();
        db.register_shop("down").await.unwrap();
        db.register_shop("gone").await.unwrap();
        let ok = db.register_shop("ok").await.unwrap();

        let source = ScriptedSource::new(vec![
            ("down", Err(503)),
            ("ok", Ok(SalesReading::Count(10))),
        ]);

        let report = run_cycle(&db, &source, &CycleOptions::default()).await.unwrap();

        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(report
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::FetchFailed { .. })));
        assert_eq!(db.list_snapshots_by_shop(ok.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shops_are_visited_in_registration_order() {
        let db = Database::open_in_memory().unwrap();
        for name in ["z", "m", "a"] {
            db.register_shop(name).await.unwrap();
        }

        let source = ScriptedSource::new(vec![]);
        run_cycle(&db, &source, &CycleOptions::default()).await.unwrap();

        assert_eq!(*source.calls.lock().unwrap(), vec!["z", "m", "a"]);
    }

    #[tokio::test]
    async fn empty_registry_produces_empty_report() {
        let db = Database::open_in_memory().unwrap();
        let source = ScriptedSource::new(vec![]);

        let report = run_cycle(&db, &source, &CycleOptions::default()).await.unwrap();
        assert!(report.updated.is_empty());
        assert!(report.skipped.is_empty());
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn ingest_reading_writes_only_counts() {
        let db = Database::open_in_memory().unwrap();
        db.register_shop("acme").await.unwrap();
        let shop = db.get_shop_by_name("acme").await.unwrap().unwrap();

        let none = ingest_reading(&db, &shop, SalesReading::NotFound, Utc::now())
            .await
            .unwrap();
        assert!(none.is_none());

        let id = ingest_reading(&db, &shop, SalesReading::Count(3), Utc::now())
            .await
            .unwrap()
            .unwrap();
        let history = db.list_snapshots_by_shop(shop.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
    }

    #[tokio::test]
    async fn repeated_cycles_accumulate_history() {
        let db = Database::open_in_memory().unwrap();
        let shop = db.register_shop("acme").await.unwrap();
        let source = ScriptedSource::new(vec![("acme", Ok(SalesReading::Count(5)))]);

        for _ in 0..3 {
            run_cycle(&db, &source, &CycleOptions::default()).await.unwrap();
        }

        assert_eq!(db.list_snapshots_by_shop(shop.id).await.unwrap().len(), 3);
    }
}
