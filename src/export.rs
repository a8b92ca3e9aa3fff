//! CSV and JSON renderings of the stored history and derived metrics.

use std::io::{self, Write};

use serde::Serialize;

use crate::{
    db::{helpers::format_datetime, Shop, Snapshot},
    metrics::ShopMetrics,
};

pub const HISTORY_HEADER: [&str; 3] = ["Shop Name", "Timestamp", "Total Sales"];
pub const METRICS_HEADER: [&str; 5] = ["Shop Name", "Latest Sales", "Today Δ", "7-Day Sales", "30-Day Sales"];

/// Everything stored, in the shape consumers of the shop listing expect.
#[derive(Debug, Clone, Serialize)]
pub struct ShopsListing {
    pub shops: Vec<Shop>,
    pub sales: Vec<Snapshot>,
}

impl ShopsListing {
    pub fn new(shops: Vec<Shop>, pairs: Vec<(Shop, Snapshot)>) -> Self {
        Self {
            shops,
            sales: pairs.into_iter().map(|(_, snapshot)| snapshot).collect(),
        }
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// One row per snapshot: shop name, timestamp, cumulative sales.
pub fn write_history_csv<W: Write>(w: &mut W, rows: &[(Shop, Snapshot)]) -> io::Result<()> {
    write_row(w, &HISTORY_HEADER)?;
    for (shop, snapshot) in rows {
        write_row(
            w,
            &[
                shop.name.clone(),
                format_datetime(&snapshot.timestamp),
                snapshot.total_sales.to_string(),
            ],
        )?;
    }
    w.flush()
}

pub fn write_metrics_csv<W: Write>(w: &mut W, rows: &[ShopMetrics]) -> io::Result<()> {
    write_row(w, &METRICS_HEADER)?;
    for row in rows {
        let m = &row.metrics;
        write_row(
            w,
            &[
                row.shop.name.clone(),
                m.latest.to_string(),
                m.diff.to_string(),
                m.last7.to_string(),
                m.last30.to_string(),
            ],
        )?;
    }
    w.flush()
}
