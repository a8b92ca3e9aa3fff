use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable reading of a shop's cumulative sales counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: i64,
    pub shop_id: i64,
    pub total_sales: u64,
    pub timestamp: DateTime<Utc>,
}
