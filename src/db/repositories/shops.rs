use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime},
    models::{RegisteredShop, Shop},
};
use crate::errors::ValidationError;

fn row_to_shop(row: &Row) -> Result<Shop> {
    let created_at: String = row.get("created_at")?;

    Ok(Shop {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

pub struct ShopRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ShopRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert the shop unless the name is already tracked.
    pub fn register(&self, name: &str) -> Result<RegisteredShop> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyShopName.into());
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO shops (name, created_at) VALUES (?1, ?2)",
            params![name, format_datetime(&Utc::now())],
        )?;

        let id: i64 = self
            .conn
            .query_row("SELECT id FROM shops WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| anyhow!("shop {name} not found after insert"))?;

        Ok(RegisteredShop {
            id,
            name: name.to_string(),
            created: inserted > 0,
        })
    }

    pub fn exists(&self, shop_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM shops WHERE id = ?1", params![shop_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Shop>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM shops WHERE name = ?1")?;
        let mut rows = stmt.query(params![name.trim()])?;
        let shop = match rows.next()? {
            Some(row) => Some(row_to_shop(row)?),
            None => None,
        };
        Ok(shop)
    }

    /// All shops in registration order.
    pub fn list(&self) -> Result<Vec<Shop>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM shops ORDER BY id ASC")?;

        let mut rows = stmt.query([])?;
        let mut shops = Vec::new();
        while let Some(row) = rows.next()? {
            shops.push(row_to_shop(row)?);
        }

        Ok(shops)
    }
}

impl Database {
    /// Register a shop by name. Registering a known name is a no-op that
    /// returns the existing id with `created: false`.
    pub async fn register_shop(&self, name: &str) -> Result<RegisteredShop> {
        let name = name.to_string();
        self.execute(move |conn| ShopRepository::new(conn).register(&name))
            .await
    }

    pub async fn list_shops(&self) -> Result<Vec<Shop>> {
        self.execute(|conn| ShopRepository::new(conn).list()).await
    }

    pub async fn get_shop_by_name(&self, name: &str) -> Result<Option<Shop>> {
        let name = name.to_string();
        self.execute(move |conn| ShopRepository::new(conn).get_by_name(&name))
            .await
    }
}
