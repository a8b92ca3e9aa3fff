use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::debug;
use reqwest::Url;

use super::{extract_sales_count, SalesReading, SalesSource};
use crate::errors::FetchError;

/// Reads sales counters from public storefront pages over HTTP.
///
/// One GET per call, no retries. The client timeout bounds every request.
pub struct HttpSalesSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSalesSource {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("failed to build HTTP client")?;

        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid base URL {base_url}"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("base URL {base_url} cannot hold a shop path"));
        }

        Ok(Self { client, base_url })
    }

    /// The shop page URL. The name is one percent-encoded path segment.
    pub fn shop_url(&self, shop_name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(shop_name);
        }
        url
    }
}

impl SalesSource for HttpSalesSource {
    async fn fetch_sales(&self, shop_name: &str) -> Result<SalesReading, FetchError> {
        let url = self.shop_url(shop_name);
        debug!("fetching {url}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        Ok(extract_sales_count(&body).into())
    }
}
