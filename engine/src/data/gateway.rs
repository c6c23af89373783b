// Snapshot store gateway: the object-storage seam the engine reads snapshots through.
use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, FetchError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, FetchError>;
}

// Length of one collector bucket.
pub fn bucket_length() -> Duration {
    Duration::minutes(10)
}

pub fn bucket_floor(at: DateTime<Utc>) -> DateTime<Utc> {
    // Truncating a UTC timestamp to a whole number of minutes cannot fail.
    at.duration_trunc(bucket_length()).unwrap_or(at)
}

// Every bucket start from the bucket containing `from` up to the one containing `to`.
pub fn buckets_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut buckets = Vec::new();
    let mut current = bucket_floor(from);
    while current <= to {
        buckets.push(current);
        current += bucket_length();
    }
    buckets
}

// Object naming for one snapshot category, e.g. prefix "coins", stem "coins":
// coins/coins_20241120_121003.csv
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotCategory {
    pub prefix: String,
    pub stem: String,
}

impl SnapshotCategory {
    pub fn new(prefix: impl Into<String>, stem: impl Into<String>) -> Self {
        SnapshotCategory { prefix: prefix.into(), stem: stem.into() }
    }

    // Key a collector writes for a snapshot taken at `at`.
    pub fn object_key(&self, at: DateTime<Utc>) -> String {
        format!("{}/{}_{}.csv", self.prefix, self.stem, at.format("%Y%m%d_%H%M%S"))
    }

    // Listing prefix selecting the 10-minute bucket containing `at`.
    // Matches keys written with either HHMM or HHMMSS suffixes.
    pub fn bucket_prefix(&self, at: DateTime<Utc>) -> String {
        format!("{}/{}_{}{}", self.prefix, self.stem, at.format("%Y%m%d_%H"), at.minute() / 10)
    }
}

// Local directory acting as the bucket; keys are '/'-separated paths under `root`.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDirStore { root: root.into() }
    }

    fn unreachable(key: &str, err: std::io::Error) -> FetchError {
        FetchError::Unreachable { key: key.to_string(), message: err.to_string() }
    }
}

#[async_trait]
impl SnapshotStore for LocalDirStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, FetchError> {
        let (dir_part, name_prefix) = match prefix.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", prefix),
        };
        let dir = self.root.join(dir_part);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // A prefix nobody has written under yet simply has no objects.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::unreachable(prefix, e)),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::unreachable(prefix, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(name_prefix) {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| Self::unreachable(prefix, e))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(|e| Self::unreachable(prefix, e))?;
            let key = if dir_part.is_empty() { name } else { format!("{}/{}", dir_part, name) };
            objects.push(ObjectMeta { key, last_modified: DateTime::<Utc>::from(modified) });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        match tokio::fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FetchError::NotFound(key.to_string())),
            Err(e) => Err(Self::unreachable(key, e)),
        }
    }
}

// In-process bucket with explicit last-modified times; used by tests and dry runs.
#[derive(Default)]
pub struct InMemoryStore {
    objects: RwLock<BTreeMap<String, (DateTime<Utc>, Vec<u8>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, body: impl Into<Vec<u8>>, last_modified: DateTime<Utc>) {
        self.objects.write().await.insert(key.into(), (last_modified, body.into()));
    }
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, FetchError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, (last_modified, _))| ObjectMeta { key: key.clone(), last_modified: *last_modified })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| FetchError::NotFound(key.to_string()))
    }
}
