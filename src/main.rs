//! ASCESA backend
//!
//! Main application entry point

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use ascesa::{
    config::Settings,
    database::{connection::create_pool, run_migrations, DatabaseConfig},
    server::{build_router, AppState},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", ascesa::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;

    // Run database migrations
    info!("Running database migrations...");
    run_migrations(&db_pool).await?;

    let bind_address = settings.bind_address();
    let sweep_interval = Duration::from_secs(settings.rate_limit.sweep_interval_seconds);

    let state = AppState::new(settings, db_pool);
    state.services.storage.ensure_root().await?;

    spawn_rate_limit_sweeper(&state, sweep_interval);
    spawn_overdue_job(&state);

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!(address = %bind_address, "ASCESA API is ready");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("ASCESA API has been shut down.");
    Ok(())
}

/// Drop expired rate limit windows so idle clients don't pin memory
fn spawn_rate_limit_sweeper(state: &AppState, every: Duration) {
    let limiter = state.rate_limit.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = limiter.sweep_expired();
            if removed > 0 {
                info!(removed = removed, remaining = limiter.len(), "Swept expired rate limit entries");
            }
        }
    });
}

/// Flag pending payments past their due date once an hour
fn spawn_overdue_job(state: &AppState) {
    let services = state.services.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            if let Err(e) = services.payment_service.mark_overdue().await {
                error!(error = %e, "Failed to mark overdue payments");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
