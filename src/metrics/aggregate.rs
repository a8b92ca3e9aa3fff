use crate::db::Snapshot;

use super::types::{DeltaPolicy, SalesMetrics};

pub const SHORT_WINDOW: usize = 7;
pub const LONG_WINDOW: usize = 30;

fn count(snapshot: &Snapshot) -> i64 {
    i64::try_from(snapshot.total_sales).unwrap_or(i64::MAX)
}

/// Derive display metrics from one shop's history, ordered newest first.
///
/// Total over every input: an empty history yields all zeros and a single
/// reading yields a zero `diff`.
pub fn compute_metrics(entries: &[Snapshot], policy: DeltaPolicy) -> SalesMetrics {
    let latest = entries.first().map(count).unwrap_or(0);
    let previous = entries.get(1).map(count).unwrap_or(latest);

    SalesMetrics {
        latest,
        diff: latest - previous,
        last7: window_sum(entries, SHORT_WINDOW, policy),
        last30: window_sum(entries, LONG_WINDOW, policy),
    }
}

/// Sales volume across the newest `window` readings: the sum of successive
/// counter differences inside the window. The oldest reading in the window
/// only serves as the baseline for its newer neighbour.
pub fn window_sum(entries: &[Snapshot], window: usize, policy: DeltaPolicy) -> i64 {
    let end = window.min(entries.len());

    entries[..end]
        .windows(2)
        .map(|pair| {
            let delta = count(&pair[0]).saturating_sub(count(&pair[1]));
            match policy {
                DeltaPolicy::Raw => delta,
                DeltaPolicy::ClampNegative => delta.max(0),
            }
        })
        .fold(0i64, i64::saturating_add)
}
