mod aggregate;
mod types;

pub use aggregate::{compute_metrics, window_sum, LONG_WINDOW, SHORT_WINDOW};
pub use types::{DeltaPolicy, SalesMetrics, ShopMetrics};

use anyhow::Result;

use crate::db::Database;

/// Metrics for one shop, derived from nothing but its snapshot history.
pub async fn metrics_for_shop(
    db: &Database,
    shop_id: i64,
    policy: DeltaPolicy,
) -> Result<SalesMetrics> {
    let history = db.list_snapshots_by_shop(shop_id).await?;
    Ok(compute_metrics(&history, policy))
}

/// Metrics for every registered shop, in registration order.
pub async fn metrics_for_all_shops(db: &Database, policy: DeltaPolicy) -> Result<Vec<ShopMetrics>> {
    let shops = db.list_shops().await?;
    let mut rows = Vec::with_capacity(shops.len());

    for shop in shops {
        let metrics = metrics_for_shop(db, shop.id, policy).await?;
        rows.push(ShopMetrics { shop, metrics });
    }

    Ok(rows)
}
