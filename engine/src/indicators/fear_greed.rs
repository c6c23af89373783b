// Fear & Greed index: activity-weighted mean compound sentiment mapped onto 0..=100.
use super::IndicatorCalculator;
use crate::error::EngineError;
use serde_json::Value;
use shared::models::{FearGreedScore, SentimentSnapshot, Series};
use shared::utils::round2;

pub struct FearGreedIndex;

impl FearGreedIndex {
    pub fn new() -> Self {
        FearGreedIndex
    }

    // compound in [-1, 1] -> index in [0, 100]
    pub fn compound_to_index(compound: f64) -> f64 {
        (compound + 1.0) * 50.0
    }

    pub fn compute(&self, series: &Series<SentimentSnapshot>) -> Result<FearGreedScore, EngineError> {
        self.calculate(series.records()).map(FearGreedScore::new)
    }
}

impl Default for FearGreedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorCalculator<SentimentSnapshot> for FearGreedIndex {
    fn name(&self) -> &str {
        "FearGreed"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "weighting": "comment_count", "scale": [0, 100] })
    }

    fn calculate(&self, data: &[SentimentSnapshot]) -> Result<f64, EngineError> {
        if data.is_empty() {
            return Err(EngineError::InsufficientData("Sentiment series is empty".to_string()));
        }
        let total_activity: f64 = data.iter().map(|s| s.total_comments() as f64).sum();
        if total_activity == 0.0 {
            return Err(EngineError::InsufficientData("Sentiment series holds no comments".to_string()));
        }

        // Normalized weights sum to 1, so snapshots with more comments dominate.
        let weighted_compound: f64 = data
            .iter()
            .map(|s| (s.total_comments() as f64 / total_activity) * s.compound_mean)
            .sum();

        Ok(round2(Self::compound_to_index(weighted_compound)))
    }
}
