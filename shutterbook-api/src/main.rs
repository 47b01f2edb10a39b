use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use shutterbook_api::{app, notify::LogNotifier, payments::OfflinePaymentProvider, AppState};
use shutterbook_engine::{
    BookingConfirmer, ExpirySweeper, HoldManager, SlotGenerator, WaitlistCoordinator,
};
use shutterbook_store::{
    DbClient, PgBookingRepository, PgSessionRepository, PgSlotRepository, PgWaitlistRepository,
};
use tokio::time::{interval, Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shutterbook_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = shutterbook_store::app_config::Config::load()?;
    tracing::info!("Starting Shutterbook API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let slots = Arc::new(PgSlotRepository::new(db.pool.clone()));
    let sessions = Arc::new(PgSessionRepository::new(db.pool.clone()));
    let bookings = Arc::new(PgBookingRepository::new(db.pool.clone()));
    let waitlist = Arc::new(PgWaitlistRepository::new(db.pool.clone()));

    let notifier = Arc::new(LogNotifier);
    let payments = Arc::new(OfflinePaymentProvider);

    let rules = config.business_rules.clone();
    let coordinator = Arc::new(WaitlistCoordinator::new(
        slots.clone(),
        sessions.clone(),
        waitlist,
        notifier.clone(),
        rules.hold_ttl_minutes,
    ));
    let holds = Arc::new(HoldManager::new(
        slots.clone(),
        sessions.clone(),
        rules.hold_ttl_minutes,
    ));
    let confirmer = Arc::new(BookingConfirmer::new(
        slots.clone(),
        sessions.clone(),
        bookings.clone(),
        payments,
        notifier,
        coordinator.clone(),
    ));
    let generator = Arc::new(SlotGenerator::new(sessions.clone(), slots.clone()));

    // Background reclamation of lapsed holds. The read path already
    // treats stale holds as available; this pass keeps storage
    // consistent and drives waitlist promotion.
    let sweeper = ExpirySweeper::new(slots.clone(), coordinator.clone());
    let sweep_every = rules.sweep_interval_seconds;
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(sweep_every));
        loop {
            ticker.tick().await;
            match sweeper.sweep(Utc::now()).await {
                Ok(report) if report.reclaimed > 0 || report.failures > 0 => {
                    tracing::info!(
                        scanned = report.scanned,
                        reclaimed = report.reclaimed,
                        promoted = report.promoted,
                        failures = report.failures,
                        "sweep pass completed"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!("sweep pass failed: {}", e),
            }
        }
    });

    let app_state = AppState {
        slots,
        sessions,
        bookings,
        holds,
        confirmer,
        coordinator,
        generator,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
