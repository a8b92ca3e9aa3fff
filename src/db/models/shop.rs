//! Tracked storefronts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A storefront whose sales counter is being tracked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a registration request. `created` is false when the name was
/// already tracked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredShop {
    pub id: i64,
    pub name: String,
    pub created: bool,
}
