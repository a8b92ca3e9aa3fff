//! End-to-end checks against a file-backed database: registration, ingestion
//! cycles and the derived sales metrics.

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};
use shopwatch_lib::{
    db::Database,
    errors::FetchError,
    ingestion::{run_cycle, CycleOptions, SkipReason},
    metrics::{metrics_for_shop, DeltaPolicy, SalesMetrics},
    scrape::{SalesReading, SalesSource},
};

struct FixedSource(HashMap<String, SalesReading>);

impl FixedSource {
    fn new(entries: &[(&str, SalesReading)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(name, reading)| (name.to_string(), *reading))
                .collect(),
        )
    }
}

impl SalesSource for FixedSource {
    async fn fetch_sales(&self, shop_name: &str) -> Result<SalesReading, FetchError> {
        self.0
            .get(shop_name)
            .copied()
            .ok_or_else(|| FetchError::Network(format!("no route to {shop_name}")))
    }
}

fn temp_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("data").join("shopwatch.sqlite3")).unwrap();
    (dir, db)
}

#[tokio::test]
async fn scenario_three_readings() {
    let (_dir, db) = temp_db();
    let shop = db.register_shop("A").await.unwrap();
    let start = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();

    for (day, count) in [(0, 80), (1, 100), (2, 120)] {
        db.append_snapshot(shop.id, count, start + Duration::days(day))
            .await
            .unwrap();
    }

    let metrics = metrics_for_shop(&db, shop.id, DeltaPolicy::Raw).await.unwrap();
    assert_eq!(
        metrics,
        SalesMetrics {
            latest: 120,
            diff: 20,
            last7: 40,
            last30: 40
        }
    );
}

#[tokio::test]
async fn scenario_single_reading_and_empty_shop() {
    let (_dir, db) = temp_db();
    let b = db.register_shop("B").await.unwrap();
    let empty = db.register_shop("empty").await.unwrap();
    db.append_snapshot(b.id, 50, Utc::now()).await.unwrap();

    let metrics = metrics_for_shop(&db, b.id, DeltaPolicy::Raw).await.unwrap();
    assert_eq!(
        metrics,
        SalesMetrics {
            latest: 50,
            diff: 0,
            last7: 0,
            last30: 0
        }
    );

    let none = metrics_for_shop(&db, empty.id, DeltaPolicy::Raw).await.unwrap();
    assert_eq!(none, SalesMetrics::default());
}

#[tokio::test]
async fn scenario_not_found_shop_keeps_stale_data() {
    let (_dir, db) = temp_db();
    let a = db.register_shop("A").await.unwrap();
    let c = db.register_shop("C").await.unwrap();

    let first = FixedSource::new(&[("A", SalesReading::Count(10)), ("C", SalesReading::Count(5))]);
    run_cycle(&db, &first, &CycleOptions::default()).await.unwrap();

    let second = FixedSource::new(&[("A", SalesReading::Count(14)), ("C", SalesReading::NotFound)]);
    let report = run_cycle(&db, &second, &CycleOptions::default()).await.unwrap();

    assert_eq!(report.updated.len(), 1);
    assert_eq!(report.updated[0].shop, "A");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::NotFound);

    let a_metrics = metrics_for_shop(&db, a.id, DeltaPolicy::Raw).await.unwrap();
    assert_eq!(a_metrics.latest, 14);
    assert_eq!(a_metrics.diff, 4);

    // C still shows its last successful reading.
    let c_history = db.list_snapshots_by_shop(c.id).await.unwrap();
    assert_eq!(c_history.len(), 1);
    assert_eq!(c_history[0].total_sales, 5);
}

#[tokio::test]
async fn duplicate_registration_keeps_registry_size() {
    let (_dir, db) = temp_db();
    db.register_shop("A").await.unwrap();
    let before = db.list_shops().await.unwrap().len();

    let again = db.register_shop("A").await.unwrap();
    assert!(!again.created);
    assert_eq!(db.list_shops().await.unwrap().len(), before);
}

#[tokio::test]
async fn history_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shopwatch.sqlite3");

    let shop_id = {
        let db = Database::new(path.clone()).unwrap();
        let shop = db.register_shop("A").await.unwrap();
        db.append_snapshot(shop.id, 3, Utc::now()).await.unwrap();
        shop.id
    };

    let db = Database::new(path).unwrap();
    let history = db.list_snapshots_by_shop(shop_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].total_sales, 3);
}

#[tokio::test]
async fn concurrent_appends_are_all_kept() {
    let (_dir, db) = temp_db();
    let shop_id = db.register_shop("A").await.unwrap().id;

    let mut handles = Vec::new();
    for task in 0..4i64 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..25i64 {
                db.append_snapshot(shop_id, task * 100 + i, Utc::now())
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let history = db.list_snapshots_by_shop(shop_id).await.unwrap();
    assert_eq!(history.len(), 100);

    let mut ids: Vec<i64> = history.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 100);

    // Newest first with id as tie-breaker.
    for pair in history.windows(2) {
        assert!(
            pair[0].timestamp > pair[1].timestamp
                || (pair[0].timestamp == pair[1].timestamp && pair[0].id > pair[1].id)
        );
    }
}

#[tokio::test]
async fn counter_correction_under_both_policies() {
    let (_dir, db) = temp_db();
    let shop = db.register_shop("A").await.unwrap();
    let start = Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap();

    // Oldest to newest: 90, 110, 95 (corrected down), 100
    for (day, count) in [(0, 90), (1, 110), (2, 95), (3, 100)] {
        db.append_snapshot(shop.id, count, start + Duration::days(day))
            .await
            .unwrap();
    }

    let raw = metrics_for_shop(&db, shop.id, DeltaPolicy::Raw).await.unwrap();
    assert_eq!(raw.last7, 10);

    let clamped = metrics_for_shop(&db, shop.id, DeltaPolicy::ClampNegative)
        .await
        .unwrap();
    assert_eq!(clamped.last7, 25);
    assert_eq!(clamped.diff, raw.diff);
}
