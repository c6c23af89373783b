// Engine main entry point
use engine::config::EngineSettings;
use engine::data::fetcher::{SnapshotFetcher, SnapshotLayout};
use engine::data::gateway::LocalDirStore;
use engine::notify::{LogNotifier, Notifier, WhatsAppNotifier};
use engine::services::dashboard_service::render_chart::write_charts;
use engine::services::{DashboardService, Scheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Bitcoin sentiment dashboard...");

    let settings = match EngineSettings::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };
    info!(
        hours = settings.hours,
        storage_root = %settings.storage.root.display(),
        "Configuration loaded"
    );

    let store = LocalDirStore::new(settings.storage.root.clone());
    let fetcher = SnapshotFetcher::new(store, SnapshotLayout::from(&settings.storage), settings.storage_timeout());

    let notifier: Box<dyn Notifier> = match WhatsAppNotifier::from_settings(&settings.notifier)? {
        Some(whatsapp) => {
            info!(endpoint = whatsapp.endpoint(), "Digests will be sent over WhatsApp");
            Box::new(whatsapp)
        }
        None => {
            info!("Messaging credentials not configured, digests will be logged");
            Box::new(LogNotifier)
        }
    };

    let service = DashboardService::new(fetcher, notifier, settings.hours);
    let scheduler = Scheduler::new(service, settings.poll_interval(), settings.digest_interval());

    if let Some(dir) = settings.charts_dir.clone() {
        let mut charts_rx = scheduler.subscribe();
        tokio::spawn(async move {
            while charts_rx.changed().await.is_ok() {
                let latest = charts_rx.borrow_and_update().clone();
                if let Some(charts) = latest {
                    if let Err(e) = write_charts(&dir, &charts).await {
                        error!(error = %e, dir = %dir.display(), "Failed to write charts");
                    }
                }
            }
        });
    }

    let state = scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;
    info!(
        price_records = state.price_series.len(),
        sentiment_snapshots = state.sentiment_series.len(),
        "Dashboard stopped"
    );

    Ok(())
}
