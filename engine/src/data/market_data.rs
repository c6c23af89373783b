// Series merge engine and the dashboard state it maintains.
use chrono::{DateTime, Duration, Utc};
use shared::models::{PriceRecord, SentimentSnapshot, Series, Timestamped};

// Both series, owned by whoever drives the poll and digest cycles.
// Each cycle takes the state by value and hands back the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub price_series: Series<PriceRecord>,
    pub sentiment_series: Series<SentimentSnapshot>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }
}

// Merges `incoming` into `existing` and trims the result to `[now - window, ..]`.
// Duplicate timestamps resolve to the incoming record. An empty batch leaves
// `existing` untouched.
pub fn merge_and_window<T: Timestamped>(
    existing: Series<T>,
    incoming: Vec<T>,
    now: DateTime<Utc>,
    window: Duration,
) -> Series<T> {
    if incoming.is_empty() {
        return existing;
    }

    let before = existing.len();
    let incoming_count = incoming.len();
    let merged = Series::from_records(existing.into_records().into_iter().chain(incoming));
    let merged_count = merged.len();
    let windowed = evict_expired(merged, now, window);

    tracing::debug!(
        before,
        incoming = incoming_count,
        duplicates = before + incoming_count - merged_count,
        after = windowed.len(),
        "Merged series batch"
    );
    windowed
}

// Sliding-window eviction, applied every cycle whether or not new rows arrived.
pub fn evict_expired<T: Timestamped>(mut series: Series<T>, now: DateTime<Utc>, window: Duration) -> Series<T> {
    let evicted = series.retain_since(now - window);
    if evicted > 0 {
        tracing::debug!(evicted, remaining = series.len(), "Evicted records outside window");
    }
    series
}
