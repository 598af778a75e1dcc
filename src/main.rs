use anyhow::Context;
use devcamper_api::{
    AppState,
    config::{AppConfig, Env, StorageBackend},
    create_router,
    geocoder::{GeocoderState, MapQuestGeocoder},
    repository::{PostgresRepository, RepositoryState},
    storage::{LocalDiskStorage, S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects and migrates the database,
/// picks the storage backend and serves the API until a shutdown signal arrives.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "devcamper_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .context("failed to connect to Postgres, check DATABASE_URL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Storage
    let storage: StorageState = match &config.storage {
        StorageBackend::Disk => Arc::new(LocalDiskStorage::new(&config.file_upload_path)),
        StorageBackend::S3(s3) => Arc::new(S3StorageClient::new(s3)),
    };
    storage
        .ensure_ready()
        .await
        .context("photo storage is not usable")?;

    // 5. Geocoding
    if config.geocoder_api_key.is_empty() {
        tracing::warn!("GEOCODER_API_KEY is not set, bootcamp creation and radius search will fail");
    }
    let geocoder =
        Arc::new(MapQuestGeocoder::new(config.geocoder_api_key.clone())) as GeocoderState;

    let port = config.port;
    let app = create_router(AppState {
        repo,
        storage,
        geocoder,
        config,
    });

    // 6. Server
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui", port);

    // Peer addresses feed the per-client rate limit.
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that cannot be installed is logged
/// and never fires, leaving the other one in charge.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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
}
