use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// Anything that can live in a Series is keyed by its timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: DateTime<Utc>,
    pub currency: String,
    pub price: f64,
}

impl Timestamped for PriceRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// One snapshot summarizes the comment batch collected during one polling interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub timestamp: DateTime<Utc>,
    pub positive_count: u32,
    pub negative_count: u32,
    pub neutral_count: u32,
    pub compound_mean: f64,
}

impl SentimentSnapshot {
    pub fn total_comments(&self) -> u64 {
        u64::from(self.positive_count) + u64::from(self.negative_count) + u64::from(self.neutral_count)
    }
}

impl Timestamped for SentimentSnapshot {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// A single pre-scored comment. `compound` is in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub compound: f64,
}

/// Ordered, timestamp-deduplicated sequence of records.
///
/// Construction always goes through [`Series::from_records`], which sorts
/// ascending and keeps the last record seen for any repeated timestamp, so
/// every `Series` value upholds both invariants. Deserialization is routed
/// through it as well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<T> {
    records: Vec<T>,
}

impl<'de, T: Timestamped + Deserialize<'de>> Deserialize<'de> for Series<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw<R> {
            records: Vec<R>,
        }
        Raw::<T>::deserialize(deserializer).map(|raw| Series::from_records(raw.records))
    }
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Series { records: Vec::new() }
    }
}

impl<T: Timestamped> Series<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I: IntoIterator<Item = T>>(records: I) -> Self {
        // Later inserts overwrite earlier ones: last-write-wins on duplicates.
        let by_timestamp: BTreeMap<DateTime<Utc>, T> = records
            .into_iter()
            .map(|record| (record.timestamp(), record))
            .collect();
        Series {
            records: by_timestamp.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.records.last()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(Timestamped::timestamp)
    }

    // Drops every record older than `cutoff`; returns how many were removed.
    pub fn retain_since(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.timestamp() >= cutoff);
        before - self.records.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FearGreedLabel {
    ExtremeFear,
    Fear,
    Greed,
    ExtremeGreed,
    Unknown,
}

impl FearGreedLabel {
    // Upper bounds are inclusive and checked in ascending order, so a value
    // between two integer bounds (e.g. 25.01) belongs to the higher band.
    pub fn from_index(value: f64) -> Self {
        if !(0.0..=100.0).contains(&value) {
            return FearGreedLabel::Unknown;
        }
        const BANDS: [(f64, FearGreedLabel); 4] = [
            (25.0, FearGreedLabel::ExtremeFear),
            (50.0, FearGreedLabel::Fear),
            (75.0, FearGreedLabel::Greed),
            (100.0, FearGreedLabel::ExtremeGreed),
        ];
        BANDS
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map(|(_, label)| *label)
            .unwrap_or(FearGreedLabel::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FearGreedLabel::ExtremeFear => "Extreme Fear",
            FearGreedLabel::Fear => "Fear",
            FearGreedLabel::Greed => "Greed",
            FearGreedLabel::ExtremeGreed => "Extreme Greed",
            FearGreedLabel::Unknown => "Unknown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            FearGreedLabel::ExtremeFear => "red",
            FearGreedLabel::Fear => "orange",
            FearGreedLabel::Greed => "light green",
            FearGreedLabel::ExtremeGreed => "dark green",
            FearGreedLabel::Unknown => "gray",
        }
    }
}

impl std::fmt::Display for FearGreedLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FearGreedScore {
    pub value: f64,
    pub label: FearGreedLabel,
}

impl FearGreedScore {
    pub fn new(value: f64) -> Self {
        FearGreedScore {
            value,
            label: FearGreedLabel::from_index(value),
        }
    }
}

// Render contract handed to the charting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: DateTime<Utc>,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTrace {
    pub name: String,
    pub color: String,
    pub mode: String, // "lines", "lines+markers"
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub traces: Vec<ChartTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRender {
    Chart(ChartSpec),
    Empty { title: String },
}

impl ChartRender {
    pub const NO_DATA_TITLE: &'static str = "No data available";

    pub fn no_data() -> Self {
        ChartRender::Empty {
            title: Self::NO_DATA_TITLE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ChartRender::Empty { .. })
    }
}

// Everything the rendering layer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardCharts {
    pub rendered_at: DateTime<Utc>,
    pub price: ChartRender,
    pub sentiment: ChartRender,
    pub overlay: ChartRender,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn price(minutes: i64, value: f64) -> PriceRecord {
        PriceRecord { timestamp: t(minutes), currency: "usd".to_string(), price: value }
    }

    #[test]
    fn test_series_sorts_and_dedups_last_write_wins() {
        let series = Series::from_records(vec![price(20, 3.0), price(0, 1.0), price(20, 4.0), price(10, 2.0)]);
        let prices: Vec<f64> = series.records().iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_deserialized_series_is_sorted_and_deduped() {
        let json = serde_json::json!({
            "records": [
                { "timestamp": "2024-11-20T00:20:00Z", "currency": "usd", "price": 3.0 },
                { "timestamp": "2024-11-20T00:00:00Z", "currency": "usd", "price": 1.0 },
                { "timestamp": "2024-11-20T00:20:00Z", "currency": "usd", "price": 4.0 }
            ]
        });
        let series: Series<PriceRecord> = serde_json::from_value(json).unwrap();
        let prices: Vec<f64> = series.records().iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![1.0, 4.0]);
    }

    #[test]
    fn test_total_comments_does_not_overflow() {
        let snapshot = SentimentSnapshot {
            timestamp: t(0),
            positive_count: u32::MAX,
            negative_count: u32::MAX,
            neutral_count: 1,
            compound_mean: 0.0,
        };
        assert_eq!(snapshot.total_comments(), 2 * u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_series_retain_since_counts_evictions() {
        let mut series = Series::from_records(vec![price(0, 1.0), price(10, 2.0), price(20, 3.0)]);
        let evicted = series.retain_since(t(10));
        assert_eq!(evicted, 1);
        assert_eq!(series.first().unwrap().timestamp, t(10));
        assert_eq!(series.latest_timestamp(), Some(t(20)));
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(FearGreedLabel::from_index(0.0), FearGreedLabel::ExtremeFear);
        assert_eq!(FearGreedLabel::from_index(25.0), FearGreedLabel::ExtremeFear);
        assert_eq!(FearGreedLabel::from_index(25.01), FearGreedLabel::Fear);
        assert_eq!(FearGreedLabel::from_index(50.0), FearGreedLabel::Fear);
        assert_eq!(FearGreedLabel::from_index(50.5), FearGreedLabel::Greed);
        assert_eq!(FearGreedLabel::from_index(75.0), FearGreedLabel::Greed);
        assert_eq!(FearGreedLabel::from_index(100.0), FearGreedLabel::ExtremeGreed);
        assert_eq!(FearGreedLabel::from_index(-1.0), FearGreedLabel::Unknown);
        assert_eq!(FearGreedLabel::from_index(101.0), FearGreedLabel::Unknown);
        assert_eq!(FearGreedLabel::from_index(f64::NAN), FearGreedLabel::Unknown);
    }

    #[test]
    fn test_label_text_and_color() {
        assert_eq!(FearGreedLabel::ExtremeGreed.to_string(), "Extreme Greed");
        assert_eq!(FearGreedLabel::Greed.color(), "light green");
        assert_eq!(FearGreedScore::new(10.0).label, FearGreedLabel::ExtremeFear);
    }

    #[test]
    fn test_empty_chart_serializes_with_kind_tag() {
        let json = serde_json::to_value(ChartRender::no_data()).unwrap();
        assert_eq!(json["kind"], "empty");
        assert_eq!(json["title"], "No data available");
    }
}
