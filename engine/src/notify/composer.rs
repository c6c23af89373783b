// Builds the periodic digest from the two windowed series.
use chrono::{DateTime, Utc};
use shared::models::{FearGreedScore, PriceRecord, SentimentSnapshot, Series};
use shared::utils::signed_percent;
use uuid::Uuid;

use crate::error::EngineError;
use crate::indicators::{FearGreedIndex, IndicatorCalculator, PriceChange};

pub const CLOSING_LINE: &str = "Stay updated for more insights! 🚀";

#[derive(Debug, Clone, PartialEq)]
pub struct DigestMessage {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_price: f64,
    pub price_change_pct: f64,
    pub fear_greed: FearGreedScore,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DigestOutcome {
    Message(DigestMessage),
    // Normal outcome when there is nothing meaningful to report.
    Skipped { reason: String },
}

impl DigestOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, DigestOutcome::Skipped { .. })
    }
}

pub fn compose_digest(
    price_series: &Series<PriceRecord>,
    sentiment_series: &Series<SentimentSnapshot>,
    window_hours: u32,
    now: DateTime<Utc>,
) -> DigestOutcome {
    if price_series.is_empty() || sentiment_series.is_empty() {
        return DigestOutcome::Skipped {
            reason: format!(
                "Not enough data (price records: {}, sentiment snapshots: {})",
                price_series.len(),
                sentiment_series.len()
            ),
        };
    }

    match build_message(price_series, sentiment_series, window_hours, now) {
        Ok(message) => DigestOutcome::Message(message),
        Err(e) => {
            if !e.is_insufficient_data() {
                tracing::warn!(error = %e, "Digest indicators could not be computed");
            }
            DigestOutcome::Skipped { reason: e.to_string() }
        }
    }
}

fn build_message(
    price_series: &Series<PriceRecord>,
    sentiment_series: &Series<SentimentSnapshot>,
    window_hours: u32,
    now: DateTime<Utc>,
) -> Result<DigestMessage, EngineError> {
    let last_price = price_series
        .last()
        .map(|r| r.price)
        .ok_or_else(|| EngineError::InsufficientData("Price series is empty".to_string()))?;

    let price_change_pct = PriceChange.calculate(price_series.records())?;
    let index = FearGreedIndex::new();
    let fear_greed = index.compute(sentiment_series)?;
    tracing::debug!(
        indicator = index.name(),
        parameters = %index.parameters(),
        value = fear_greed.value,
        "Computed digest indicator"
    );

    let text = format!(
        "📊 Daily Summary:\n\
         🔹 Bitcoin Price: ${:.2}\n\
         🔹 Change (Last {} Hours): {}\n\
         📊 **Bitcoin Sentiment Index**\n\
         - Current Sentiment: {:.2}/100\n\
         - Interpretation: {} ({})\n\
         {}",
        last_price,
        window_hours,
        signed_percent(price_change_pct),
        fear_greed.value,
        fear_greed.label,
        fear_greed.label.color(),
        CLOSING_LINE
    );

    Ok(DigestMessage {
        id: Uuid::new_v4(),
        created_at: now,
        last_price,
        price_change_pct,
        fear_greed,
        text,
    })
}
