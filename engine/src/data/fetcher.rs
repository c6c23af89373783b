// Reads snapshot objects bucket by bucket and decodes them into series records.
use chrono::{DateTime, Duration, Utc};
use shared::models::{PriceRecord, SentimentSnapshot, Timestamped};
use std::future::Future;
use std::time::Duration as StdDuration;

use super::csv_parser::SnapshotCsvParser;
use super::gateway::{buckets_between, ObjectMeta, SnapshotCategory, SnapshotStore};
use crate::config::StorageSettings;
use crate::error::{EngineError, FetchError};
use crate::sentiment::scorer::score_comments;

// Where each category lives in the bucket and how price objects are read.
#[derive(Debug, Clone)]
pub struct SnapshotLayout {
    pub price: SnapshotCategory,
    pub comments: SnapshotCategory,
    pub asset_column: String,
}

impl From<&StorageSettings> for SnapshotLayout {
    fn from(settings: &StorageSettings) -> Self {
        SnapshotLayout {
            price: SnapshotCategory::new(&settings.price_prefix, &settings.price_stem),
            comments: SnapshotCategory::new(&settings.comments_prefix, &settings.comments_stem),
            asset_column: settings.asset_column.clone(),
        }
    }
}

impl Default for SnapshotLayout {
    fn default() -> Self {
        SnapshotLayout::from(&StorageSettings::default())
    }
}

// A record type that can be decoded from one snapshot object.
pub trait SnapshotRecord: Timestamped + Sized + Send {
    const KIND: &'static str;

    fn category(layout: &SnapshotLayout) -> &SnapshotCategory;

    fn decode(layout: &SnapshotLayout, object: &ObjectMeta, body: &[u8]) -> anyhow::Result<Vec<Self>>;
}

impl SnapshotRecord for PriceRecord {
    const KIND: &'static str = "price";

    fn category(layout: &SnapshotLayout) -> &SnapshotCategory {
        &layout.price
    }

    fn decode(layout: &SnapshotLayout, _object: &ObjectMeta, body: &[u8]) -> anyhow::Result<Vec<Self>> {
        SnapshotCsvParser::parse_price_records(body, &layout.asset_column)
    }
}

impl SnapshotRecord for SentimentSnapshot {
    const KIND: &'static str = "sentiment";

    fn category(layout: &SnapshotLayout) -> &SnapshotCategory {
        &layout.comments
    }

    // One comment object becomes one snapshot stamped with the object's write time.
    fn decode(_layout: &SnapshotLayout, object: &ObjectMeta, body: &[u8]) -> anyhow::Result<Vec<Self>> {
        let comments = SnapshotCsvParser::parse_comments(body)?;
        match score_comments(&comments, object.last_modified) {
            Ok(snapshot) => Ok(vec![snapshot]),
            Err(EngineError::InsufficientData(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct SnapshotFetcher<S> {
    store: S,
    layout: SnapshotLayout,
    timeout: StdDuration,
}

impl<S: SnapshotStore> SnapshotFetcher<S> {
    pub fn new(store: S, layout: SnapshotLayout, timeout: StdDuration) -> Self {
        SnapshotFetcher { store, layout, timeout }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &SnapshotLayout {
        &self.layout
    }

    // Full read of `[now - window, now]`. A bucket that fails is logged and skipped, except
    // a timeout, which ends the backfill with what was read so far; the next poll resumes
    // incrementally from there.
    pub async fn backfill<T: SnapshotRecord>(&self, now: DateTime<Utc>, window: Duration) -> Vec<T> {
        let buckets = buckets_between(now - window, now);
        tracing::info!(kind = T::KIND, buckets = buckets.len(), "Starting initial backfill");

        let mut records = Vec::new();
        for bucket in buckets {
            match self.read_bucket::<T>(bucket).await {
                Ok(mut rows) => records.append(&mut rows),
                Err(e @ FetchError::Timeout { .. }) => {
                    tracing::warn!(kind = T::KIND, bucket = %bucket, error = %e, "Storage timed out, stopping backfill");
                    break;
                }
                Err(e) => {
                    tracing::warn!(kind = T::KIND, bucket = %bucket, error = %e, "Skipping bucket during backfill");
                }
            }
        }
        tracing::info!(kind = T::KIND, count = records.len(), "Initial backfill finished");
        records
    }

    // Rows strictly newer than `since`, scanning from the bucket holding `since` up to `now`
    // (never earlier than the window start). A malformed object never becomes readable, so
    // its bucket is skipped. Storage failures fail the whole fetch so the next poll retries
    // from the same point.
    pub async fn fetch_since<T: SnapshotRecord>(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<T>, FetchError> {
        let from = std::cmp::max(since, now - window);
        let mut records = Vec::new();
        for bucket in buckets_between(from, now) {
            let rows = match self.read_bucket::<T>(bucket).await {
                Ok(rows) => rows,
                Err(e @ FetchError::MalformedCsv { .. }) => {
                    tracing::warn!(kind = T::KIND, bucket = %bucket, error = %e, "Skipping malformed snapshot");
                    continue;
                }
                Err(e) => return Err(e),
            };
            records.extend(rows.into_iter().filter(|r| r.timestamp() > since));
        }
        tracing::debug!(kind = T::KIND, since = %since, count = records.len(), "Incremental fetch finished");
        Ok(records)
    }

    // Latest object of one 10-minute bucket, decoded. An empty bucket yields no rows.
    async fn read_bucket<T: SnapshotRecord>(&self, bucket: DateTime<Utc>) -> Result<Vec<T>, FetchError> {
        let prefix = T::category(&self.layout).bucket_prefix(bucket);
        let listed = self.bounded(&prefix, self.store.list(&prefix)).await?;
        let latest = match listed.into_iter().max_by_key(|o| o.last_modified) {
            Some(object) => object,
            None => return Ok(Vec::new()),
        };

        let body = self.bounded(&latest.key, self.store.get(&latest.key)).await?;
        T::decode(&self.layout, &latest, &body).map_err(|e| FetchError::MalformedCsv {
            key: latest.key.clone(),
            message: e.to_string(),
        })
    }

    async fn bounded<O, F>(&self, key: &str, call: F) -> Result<O, FetchError>
    where
        F: Future<Output = Result<O, FetchError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| FetchError::Timeout { key: key.to_string(), after: self.timeout })?
    }
}
