// Handler for one ingestion step of a single series
use chrono::{DateTime, Duration, Utc};
use shared::models::Series;

use crate::data::fetcher::{SnapshotFetcher, SnapshotRecord};
use crate::data::gateway::SnapshotStore;
use crate::data::market_data::{evict_expired, merge_and_window};

// Empty series: backfill the whole window. Otherwise: fetch only rows newer than the
// latest held timestamp and merge them. A failed fetch keeps the prior series; the
// next poll is the retry. Eviction runs either way.
pub async fn handle_refresh_series<T, S>(
    series: Series<T>,
    fetcher: &SnapshotFetcher<S>,
    now: DateTime<Utc>,
    window: Duration,
) -> Series<T>
where
    T: SnapshotRecord,
    S: SnapshotStore,
{
    let refreshed = match series.latest_timestamp() {
        None => {
            let rows = fetcher.backfill::<T>(now, window).await;
            merge_and_window(series, rows, now, window)
        }
        Some(since) => match fetcher.fetch_since::<T>(since, now, window).await {
            Ok(rows) => {
                tracing::info!(kind = T::KIND, new_rows = rows.len(), "Fetched new snapshot rows");
                merge_and_window(series, rows, now, window)
            }
            Err(e) => {
                tracing::warn!(kind = T::KIND, since = %since, error = %e, "Fetch failed, keeping previous series");
                series
            }
        },
    };

    evict_expired(refreshed, now, window)
}
