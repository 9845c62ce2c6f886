//! facelink-ae - Auto-Enrollment Microservice
//!
//! Ingests face-detection notifications from the recognition pipeline and
//! decides, per configured stream, whether and when to enroll a detected
//! face into a watchlist: validation, debouncing, time-windowed best-frame
//! selection, duplicate suppression, enrollment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use facelink_ae::config::Settings;
use facelink_ae::services::{
    DebounceService, EnrollmentClient, PipelineContext, PipelineDispatcher, StreamConfigResolver,
    TrackletAggregator,
};
use facelink_ae::{build_router, AppState};

/// Fixed cadence of the debounce/tracklet sweep.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Command-line arguments for facelink-ae
#[derive(Parser, Debug)]
#[command(name = "facelink-ae")]
#[command(about = "Auto-enrollment microservice for the Facelink connector suite")]
#[command(version)]
struct Args {
    /// Path to the TOML settings document
    #[arg(short, long, env = "FACELINK_AE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides [server].listen)
    #[arg(short, long, env = "FACELINK_AE_LISTEN")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "facelink_ae=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting facelink-ae (Auto Enrollment)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = facelink_common::config::resolve_config_path(
        args.config.as_deref(),
        "FACELINK_AE_CONFIG",
        "facelink-ae",
    )
    .context("Failed to resolve config file")?;
    info!("Settings: {}", config_path.display());

    let settings = Arc::new(Settings::load(&config_path).context("Failed to load settings")?);
    info!(
        streams = settings.stream_configurations.len(),
        apply_for_all_streams = settings.config.apply_for_all_streams,
        strategy = ?settings.config.enroll_strategy,
        "Settings loaded"
    );

    // Assemble the pipeline
    let context = PipelineContext {
        resolver: StreamConfigResolver::new(Arc::clone(&settings)),
        debounce: Arc::new(DebounceService::new(Duration::from_millis(
            settings.config.hard_absolute_expiration_ms(),
        ))),
        aggregator: Arc::new(TrackletAggregator::new(Duration::from_millis(
            settings.config.tracklet_timeout_ms(),
        ))),
        enrollment: Arc::new(
            EnrollmentClient::new(&settings).context("Failed to create enrollment client")?,
        ),
        enroll_strategy: settings.config.enroll_strategy,
    };

    let dispatcher = PipelineDispatcher::start(
        context,
        settings.config.max_parallel_blocks(),
        SWEEP_INTERVAL,
    );

    let state = AppState::new(Arc::clone(&dispatcher));
    let app = build_router(state);

    let listen = args.listen.unwrap_or_else(|| settings.server.listen.clone());
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind to {listen}"))?;
    info!("Listening on http://{}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    dispatcher.stop().await;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
