use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::db::Shop;

/// How a decreasing counter between two readings is counted in window sums.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DeltaPolicy {
    /// Sum pairwise differences as-is; a counter drop subtracts volume.
    #[default]
    Raw,
    /// Treat a counter drop as zero volume for that step.
    ClampNegative,
}

impl DeltaPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaPolicy::Raw => "raw",
            DeltaPolicy::ClampNegative => "clamp-negative",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SalesMetrics {
    pub latest: i64,
    pub diff: i64,
    pub last7: i64,
    pub last30: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopMetrics {
    pub shop: Shop,
    pub metrics: SalesMetrics,
}
