//! Storefront scraping: fetch a shop page and read its sales counter.

mod extract;
mod http;

pub use extract::extract_sales_count;
pub use http::HttpSalesSource;

use std::future::Future;

use serde::Serialize;

use crate::errors::FetchError;

/// What a scrape produced for one shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SalesReading {
    Count(u64),
    /// The page loaded but held no readable counter.
    NotFound,
}

impl From<Option<u64>> for SalesReading {
    fn from(value: Option<u64>) -> Self {
        match value {
            Some(count) => SalesReading::Count(count),
            None => SalesReading::NotFound,
        }
    }
}

/// Anything that can report a shop's current cumulative sales.
pub trait SalesSource: Send + Sync {
    fn fetch_sales(
        &self,
        shop_name: &str,
    ) -> impl Future<Output = Result<SalesReading, FetchError>> + Send;
}
