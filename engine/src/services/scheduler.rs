// Drives the poll and digest timers from a single task that owns the dashboard state.
// Only one cycle runs at a time, so the state needs no lock.
use chrono::Utc;
use shared::models::DashboardCharts;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

use super::dashboard_service::{DashboardService, DigestDelivery};
use crate::data::gateway::SnapshotStore;
use crate::data::market_data::DashboardState;
use crate::notify::Notifier;

pub struct Scheduler<S, N> {
    service: DashboardService<S, N>,
    poll_interval: Duration,
    digest_interval: Duration,
    charts_tx: watch::Sender<Option<DashboardCharts>>,
}

impl<S: SnapshotStore, N: Notifier> Scheduler<S, N> {
    pub fn new(service: DashboardService<S, N>, poll_interval: Duration, digest_interval: Duration) -> Self {
        let (charts_tx, _) = watch::channel(None);
        Scheduler { service, poll_interval, digest_interval, charts_tx }
    }

    // Latest rendered chart set; `None` until the first poll completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardCharts>> {
        self.charts_tx.subscribe()
    }

    // Polls immediately, then every `poll_interval`; the first digest fires after one full
    // `digest_interval`. Returns the final state once `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> DashboardState
    where
        F: Future<Output = ()>,
    {
        let mut state = DashboardState::new();
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut digest = interval_at(Instant::now() + self.digest_interval, self.digest_interval);
        digest.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            digest_interval_secs = self.digest_interval.as_secs(),
            "Scheduler started"
        );
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = poll.tick() => {
                    let (next, charts) = self.service.poll(std::mem::take(&mut state), Utc::now()).await;
                    state = next;
                    self.charts_tx.send_replace(Some(charts));
                }
                _ = digest.tick() => {
                    tracing::info!("Executing scheduled digest");
                    match self.service.digest(&state, Utc::now()).await {
                        DigestDelivery::Sent { id } => tracing::info!(digest_id = %id, "Digest sent"),
                        DigestDelivery::Skipped { reason } => tracing::info!(reason = %reason, "No digest this cycle"),
                        DigestDelivery::Failed { id, error } => {
                            tracing::warn!(digest_id = %id, error = %error, "Digest not delivered, will retry next cycle")
                        }
                    }
                }
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fetcher::{SnapshotFetcher, SnapshotLayout};
    use crate::data::gateway::InMemoryStore;
    use crate::error::EngineError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) -> Result<(), EngineError> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let layout = SnapshotLayout::default();
        let ts = Utc::now() - chrono::Duration::minutes(5);
        let body = format!("currency,bitcoin,date\nusd,97000.0,{}\n", ts.format("%Y-%m-%d %H:%M:%S"));
        store.put(layout.price.object_key(ts), body, ts).await;
        store.put(layout.comments.object_key(ts), "title,compound\na,0.6\n", ts).await;
        store
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_poll_and_digest_until_shutdown() {
        let notifier = RecordingNotifier::default();
        let fetcher = SnapshotFetcher::new(seeded_store().await, SnapshotLayout::default(), Duration::from_secs(5));
        let service = DashboardService::new(fetcher, notifier.clone(), 12);
        let scheduler = Scheduler::new(service, Duration::from_secs(600), Duration::from_secs(3600));
        let charts = scheduler.subscribe();

        // 70 minutes of paused time: 8 polls, 1 digest.
        let state = scheduler.run(tokio::time::sleep(Duration::from_secs(70 * 60))).await;

        assert_eq!(state.price_series.len(), 1);
        assert_eq!(state.sentiment_series.len(), 1);
        let latest = charts.borrow().clone().expect("charts published");
        assert!(!latest.price.is_empty());
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Current Sentiment: 80.00/100"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_store_never_sends() {
        let notifier = RecordingNotifier::default();
        let fetcher = SnapshotFetcher::new(InMemoryStore::new(), SnapshotLayout::default(), Duration::from_secs(5));
        let service = DashboardService::new(fetcher, notifier.clone(), 12);
        let scheduler = Scheduler::new(service, Duration::from_secs(600), Duration::from_secs(1200));

        let state = scheduler.run(tokio::time::sleep(Duration::from_secs(3000))).await;
        assert_eq!(state, DashboardState::new());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
