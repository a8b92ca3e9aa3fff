use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_u64},
    models::{Shop, Snapshot},
    repositories::shops::ShopRepository,
};
use crate::errors::ValidationError;

fn row_to_snapshot(row: &Row) -> Result<Snapshot> {
    let total_sales: i64 = row.get("total_sales")?;
    let timestamp: String = row.get("timestamp")?;

    Ok(Snapshot {
        id: row.get("id")?,
        shop_id: row.get("shop_id")?,
        total_sales: to_u64(total_sales, "total_sales")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
    })
}

/// Append-only access to the snapshot log. There is deliberately no update
/// or delete; corrections are new rows.
pub struct SnapshotRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SnapshotRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn append(
        &self,
        shop_id: i64,
        total_sales: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        if total_sales < 0 {
            return Err(ValidationError::NegativeSales(total_sales).into());
        }
        if !ShopRepository::new(self.conn).exists(shop_id)? {
            return Err(ValidationError::UnknownShop(shop_id).into());
        }

        self.conn.execute(
            "INSERT INTO snapshots (shop_id, total_sales, timestamp) VALUES (?1, ?2, ?3)",
            params![shop_id, total_sales, format_datetime(&timestamp)],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Newest first. Equal timestamps fall back to insertion order, newest
    /// insert first.
    pub fn list_by_shop(&self, shop_id: i64) -> Result<Vec<Snapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, shop_id, total_sales, timestamp
             FROM snapshots
             WHERE shop_id = ?1
             ORDER BY timestamp DESC, id DESC",
        )?;

        let mut rows = stmt.query(params![shop_id])?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows.next()? {
            snapshots.push(row_to_snapshot(row)?);
        }

        Ok(snapshots)
    }

    /// Every snapshot paired with its shop, grouped by shop and oldest first
    /// within each shop.
    pub fn list_all(&self) -> Result<Vec<(Shop, Snapshot)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id AS id, s.shop_id AS shop_id, s.total_sales AS total_sales,
                    s.timestamp AS timestamp,
                    sh.name AS shop_name, sh.created_at AS shop_created_at
             FROM snapshots s
             JOIN shops sh ON sh.id = s.shop_id
             ORDER BY s.shop_id ASC, s.timestamp ASC, s.id ASC",
        )?;

        let mut rows = stmt.query([])?;
        let mut pairs = Vec::new();
        while let Some(row) = rows.next()? {
            let snapshot = row_to_snapshot(row)?;
            let created_at: String = row.get("shop_created_at")?;
            let shop = Shop {
                id: snapshot.shop_id,
                name: row.get("shop_name")?,
                created_at: parse_datetime(&created_at, "created_at")?,
            };
            pairs.push((shop, snapshot));
        }

        Ok(pairs)
    }
}

impl Database {
    /// Append one observation. Rejects negative counts and unregistered
    /// shops with a [`ValidationError`].
    pub async fn append_snapshot(
        &self,
        shop_id: i64,
        total_sales: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        self.execute(move |conn| {
            SnapshotRepository::new(conn).append(shop_id, total_sales, timestamp)
        })
        .await
    }

    pub async fn list_snapshots_by_shop(&self, shop_id: i64) -> Result<Vec<Snapshot>> {
        self.execute(move |conn| SnapshotRepository::new(conn).list_by_shop(shop_id))
            .await
    }

    pub async fn list_all_snapshots(&self) -> Result<Vec<(Shop, Snapshot)>> {
        self.execute(|conn| SnapshotRepository::new(conn).list_all())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn appended_snapshot_is_listed_first_exactly_once() {
        let db = Database::open_in_memory().unwrap();
        let shop = db.register_shop("acme").await.unwrap();

        db.append_snapshot(shop.id, 80, at(1)).await.unwrap();
        db.append_snapshot(shop.id, 100, at(2)).await.unwrap();
        let id = db.append_snapshot(shop.id, 120, at(3)).await.unwrap();

        let history = db.list_snapshots_by_shop(shop.id).await.unwrap();
        let counts: Vec<u64> = history.iter().map(|s| s.total_sales).collect();
        assert_eq!(counts, vec![120, 100, 80]);
        assert_eq!(history[0].id, id);
        assert_eq!(history.iter().filter(|s| s.id == id).count(), 1);
    }

    #[tokio::test]
    async fn ties_break_by_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        let shop = db.register_shop("acme").await.unwrap();

        db.append_snapshot(shop.id, 10, at(5)).await.unwrap();
        db.append_snapshot(shop.id, 12, at(5)).await.unwrap();

        let history = db.list_snapshots_by_shop(shop.id).await.unwrap();
        assert_eq!(history[0].total_sales, 12);
        assert_eq!(history[1].total_sales, 10);
    }

    #[tokio::test]
    async fn ordering_follows_timestamp_not_insertion() {
        let db = Database::open_in_memory().unwrap();
        let shop = db.register_shop("acme").await.unwrap();

        let base = at(10);
        db.append_snapshot(shop.id, 30, base).await.unwrap();
        db.append_snapshot(shop.id, 20, base - Duration::hours(1)).await.unwrap();

        let history = db.list_snapshots_by_shop(shop.id).await.unwrap();
        assert_eq!(history[0].total_sales, 30);
    }

    #[tokio::test]
    async fn negative_count_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let shop = db.register_shop("acme").await.unwrap();

        let err = db.append_snapshot(shop.id, -1, at(1)).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NegativeSales(-1))
        );
        assert!(db.list_snapshots_by_shop(shop.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_shop_is_rejected() {
        let db = Database::open_in_memory().unwrap();

        let err = db.append_snapshot(42, 5, at(1)).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownShop(42))
        );
    }

    #[tokio::test]
    async fn empty_history_lists_nothing() {
        let db = Database::open_in_memory().unwrap();
        let shop = db.register_shop("acme").await.unwrap();
        assert!(db.list_snapshots_by_shop(shop.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_all_pairs_snapshots_with_shops() {
        let db = Database::open_in_memory().unwrap();
        let a = db.register_shop("a").await.unwrap();
        let b = db.register_shop("b").await.unwrap();

        db.append_snapshot(b.id, 7, at(1)).await.unwrap();
        db.append_snapshot(a.id, 2, at(2)).await.unwrap();
        db.append_snapshot(a.id, 1, at(1)).await.unwrap();

        let all = db.list_all_snapshots().await.unwrap();
        let rows: Vec<(&str, u64)> = all
            .iter()
            .map(|(shop, snapshot)| (shop.name.as_str(), snapshot.total_sales))
            .collect();
        assert_eq!(rows, vec![("a", 1), ("a", 2), ("b", 7)]);
    }
}
