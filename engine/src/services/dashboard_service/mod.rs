// engine/src/services/dashboard_service/mod.rs
// Main module hub for the dashboard service: the DashboardService struct, which
// threads an owned DashboardState through the poll and digest cycles, plus the
// handler submodules it dispatches to.

use chrono::{DateTime, Duration, Utc};
use shared::models::DashboardCharts;

use crate::data::fetcher::SnapshotFetcher;
use crate::data::gateway::SnapshotStore;
use crate::data::market_data::DashboardState;
use crate::notify::Notifier;

pub mod helpers;
pub mod refresh_series;
pub mod render_chart;
pub mod send_digest;

pub use send_digest::DigestDelivery;

pub struct DashboardService<S, N> {
    fetcher: SnapshotFetcher<S>,
    notifier: N,
    window_hours: u32,
}

impl<S: SnapshotStore, N: Notifier> DashboardService<S, N> {
    pub fn new(fetcher: SnapshotFetcher<S>, notifier: N, window_hours: u32) -> Self {
        DashboardService { fetcher, notifier, window_hours }
    }

    pub fn window(&self) -> Duration {
        Duration::hours(i64::from(self.window_hours))
    }

    pub fn fetcher(&self) -> &SnapshotFetcher<S> {
        &self.fetcher
    }

    // One poll cycle: refresh both series, then render them.
    pub async fn poll(&self, state: DashboardState, now: DateTime<Utc>) -> (DashboardState, DashboardCharts) {
        let window = self.window();
        let DashboardState { price_series, sentiment_series } = state;

        let price_series = refresh_series::handle_refresh_series(price_series, &self.fetcher, now, window).await;
        let sentiment_series =
            refresh_series::handle_refresh_series(sentiment_series, &self.fetcher, now, window).await;
        tracing::info!(
            price_records = price_series.len(),
            sentiment_snapshots = sentiment_series.len(),
            "Poll cycle complete"
        );

        let state = DashboardState { price_series, sentiment_series };
        let charts = self.render(&state, now);
        (state, charts)
    }

    pub fn render(&self, state: &DashboardState, now: DateTime<Utc>) -> DashboardCharts {
        render_chart::handle_render(state, self.window_hours, now)
    }

    pub async fn digest(&self, state: &DashboardState, now: DateTime<Utc>) -> DigestDelivery {
        send_digest::handle_send_digest(state, &self.notifier, self.window_hours, now).await
    }
}
