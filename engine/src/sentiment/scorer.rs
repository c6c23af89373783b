// Turns a batch of pre-scored comments into one SentimentSnapshot.
use chrono::{DateTime, Utc};
use shared::models::{Comment, SentimentSnapshot};

use crate::error::EngineError;

pub const POSITIVE_THRESHOLD: f64 = 0.05;
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

pub fn classify(compound: f64) -> Polarity {
    if compound > POSITIVE_THRESHOLD {
        Polarity::Positive
    } else if compound < NEGATIVE_THRESHOLD {
        Polarity::Negative
    } else {
        Polarity::Neutral
    }
}

// `collected_at` is when the batch was taken, not when any single comment was written.
pub fn score_comments(comments: &[Comment], collected_at: DateTime<Utc>) -> Result<SentimentSnapshot, EngineError> {
    if comments.is_empty() {
        return Err(EngineError::InsufficientData(format!(
            "No comments in batch collected at {}",
            collected_at
        )));
    }

    let mut snapshot = SentimentSnapshot {
        timestamp: collected_at,
        positive_count: 0,
        negative_count: 0,
        neutral_count: 0,
        compound_mean: 0.0,
    };
    let mut sum = 0.0;
    for comment in comments {
        match classify(comment.compound) {
            Polarity::Positive => snapshot.positive_count += 1,
            Polarity::Negative => snapshot.negative_count += 1,
            Polarity::Neutral => snapshot.neutral_count += 1,
        }
        sum += comment.compound;
    }
    snapshot.compound_mean = sum / comments.len() as f64;

    tracing::debug!(
        collected_at = %collected_at,
        positive = snapshot.positive_count,
        negative = snapshot.negative_count,
        neutral = snapshot.neutral_count,
        compound_mean = snapshot.compound_mean,
        "Scored comment batch"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn comments(values: &[f64]) -> Vec<Comment> {
        values.iter().map(|&compound| Comment { compound }).collect()
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        assert_eq!(classify(0.05), Polarity::Neutral);
        assert_eq!(classify(-0.05), Polarity::Neutral);
        assert_eq!(classify(0.0501), Polarity::Positive);
        assert_eq!(classify(-0.0501), Polarity::Negative);
    }

    #[test]
    fn test_score_counts_and_mean() {
        let collected_at = Utc.with_ymd_and_hms(2024, 11, 20, 12, 10, 0).unwrap();
        let snapshot = score_comments(&comments(&[0.5, -0.25, 0.0, 0.75]), collected_at).unwrap();
        assert_eq!(snapshot.timestamp, collected_at);
        assert_eq!(snapshot.positive_count, 2);
        assert_eq!(snapshot.negative_count, 1);
        assert_eq!(snapshot.neutral_count, 1);
        assert_eq!(snapshot.total_comments(), 4);
        assert!((snapshot.compound_mean - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_batch_is_insufficient_data() {
        let result = score_comments(&[], Utc::now());
        assert!(matches!(result, Err(EngineError::InsufficientData(_))));
    }
}
