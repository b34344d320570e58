use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_core::memory::MemoryStore;
use parking_core::notify::ParkingNotifier;
use parking_core::store::ParkingStore;
use parking_core::ParkingService;
use parking_db::PgParkingStore;
use parking_events::EventBus;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parking_api::background::timeout_sweeper;
use parking_api::config::ServerConfig;
use parking_api::notifications::EventFanout;
use parking_api::router::build_app_router;
use parking_api::state::AppState;
use parking_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parking_api=debug,parking_core=debug,parking_db=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        total_spots = config.parking.total_spots,
        "Loaded server configuration"
    );

    // --- Store ---
    let store = build_store(&config).await;

    // --- Event bus + parking service ---
    let event_bus = Arc::new(EventBus::default());
    let notifier: Arc<dyn ParkingNotifier> = event_bus.clone();
    let parking = Arc::new(ParkingService::new(
        store,
        notifier,
        config.parking.clone(),
    ));

    let created = parking
        .initialize()
        .await
        .expect("Failed to initialize parking spots");
    tracing::info!(created, "Parking lot ready");

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws_manager.spawn_heartbeat(ws::HEARTBEAT_INTERVAL);

    // Spawn the fan-out (pushes every bus event to WebSocket viewers).
    let fanout = EventFanout::new(Arc::clone(&ws_manager));
    let fanout_handle = tokio::spawn(fanout.run(event_bus.subscribe()));

    // Spawn the timeout sweeper.
    let sweeper_cancel = CancellationToken::new();
    let sweeper_handle = tokio::spawn(timeout_sweeper::run(
        Arc::clone(&parking),
        config.sweep_interval(),
        sweeper_cancel.clone(),
    ));

    tracing::info!("Background services started (fan-out, timeout sweeper)");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        parking,
        ws_manager: Arc::clone(&ws_manager),
        event_bus,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweeper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), sweeper_handle).await;
    tracing::info!("Timeout sweeper stopped");

    // The parking service still holds the bus, so the channel never closes.
    fanout_handle.abort();
    tracing::info!("Event fan-out stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise keep state
/// in memory for the lifetime of the process.
async fn build_store(config: &ServerConfig) -> Arc<dyn ParkingStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory store (state is lost on restart)");
        return Arc::new(MemoryStore::new());
    };

    let pool = parking_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    parking_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    parking_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgParkingStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
