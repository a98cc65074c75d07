use bonus_points::{router, AppState, Catalog, Config, Ledger, PointsEngine};
use std::net::SocketAddr;
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let ledger = Ledger::open(&config.db_path)?;
    ledger.optimize()?;
    let event_active = ledger.seed_event_active(config.event_default)?;

    let catalog = Catalog::builtin();
    info!(
        activities = catalog.len(),
        reset_hour = config.schedule.hour(),
        utc_offset = %config.schedule.offset(),
        event_active,
        "ledger ready"
    );

    let engine = PointsEngine::new(ledger, catalog, config.schedule);
    let app = router(AppState::new(engine, config.admin_ids));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
