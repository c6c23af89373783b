// Handler for the periodic digest
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data::market_data::DashboardState;
use crate::notify::{compose_digest, DigestOutcome, Notifier};

#[derive(Debug, Clone, PartialEq)]
pub enum DigestDelivery {
    Skipped { reason: String },
    Sent { id: Uuid },
    Failed { id: Uuid, error: String },
}

// Never fails: a skipped or undeliverable digest is reported, logged, and the cycle ends.
pub async fn handle_send_digest<N: Notifier + ?Sized>(
    state: &DashboardState,
    notifier: &N,
    window_hours: u32,
    now: DateTime<Utc>,
) -> DigestDelivery {
    let message = match compose_digest(&state.price_series, &state.sentiment_series, window_hours, now) {
        DigestOutcome::Message(message) => message,
        DigestOutcome::Skipped { reason } => {
            tracing::info!(reason = %reason, "Digest skipped");
            return DigestDelivery::Skipped { reason };
        }
    };

    tracing::info!(
        digest_id = %message.id,
        last_price = message.last_price,
        change_pct = message.price_change_pct,
        fear_greed = message.fear_greed.value,
        label = %message.fear_greed.label,
        "Sending digest"
    );
    match notifier.send(&message.text).await {
        Ok(()) => DigestDelivery::Sent { id: message.id },
        Err(e) => {
            tracing::error!(digest_id = %message.id, error = %e, "Error sending digest");
            DigestDelivery::Failed { id: message.id, error: e.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use shared::models::{PriceRecord, SentimentSnapshot, Series};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) -> Result<(), EngineError> {
            if self.fail {
                return Err(EngineError::NotificationSendError("HTTP 401".to_string()));
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap()
    }

    fn populated() -> DashboardState {
        DashboardState {
            price_series: Series::from_records(vec![
                PriceRecord { timestamp: now(), currency: "usd".to_string(), price: 97000.0 },
            ]),
            sentiment_series: Series::from_records(vec![SentimentSnapshot {
                timestamp: now(),
                positive_count: 5,
                negative_count: 5,
                neutral_count: 0,
                compound_mean: 0.0,
            }]),
        }
    }

    #[tokio::test]
    async fn test_sends_composed_digest() {
        let notifier = RecordingNotifier::default();
        let delivery = handle_send_digest(&populated(), &notifier, 12, now()).await;
        assert!(matches!(delivery, DigestDelivery::Sent { .. }));
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Current Sentiment: 50.00/100"));
    }

    #[tokio::test]
    async fn test_empty_state_sends_nothing() {
        let notifier = RecordingNotifier::default();
        let delivery = handle_send_digest(&DashboardState::new(), &notifier, 12, now()).await;
        assert!(matches!(delivery, DigestDelivery::Skipped { .. }));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_not_raised() {
        let notifier = RecordingNotifier { fail: true, ..RecordingNotifier::default() };
        let delivery = handle_send_digest(&populated(), &notifier, 12, now()).await;
        match delivery {
            DigestDelivery::Failed { error, .. } => assert!(error.contains("HTTP 401")),
            other => panic!("expected a failed delivery, got {:?}", other),
        }
    }
}
