use mpesa_feedback::api::{self, AppState};
use mpesa_feedback::config::AppConfig;
use mpesa_feedback::database::{init_pool_from_config, run_migrations, PgDataStore};
use mpesa_feedback::logging::init_tracing;
use mpesa_feedback::payments::providers::{MpesaConfig, MpesaTokenProvider, UrlRegistrar};
use mpesa_feedback::payments::PaymentResult;
use mpesa_feedback::services::build_notifier;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown");
}

/// Register the confirmation/validation URLs with Daraja
async fn register_c2b_urls(config: MpesaConfig) -> PaymentResult<()> {
    let tokens = Arc::new(MpesaTokenProvider::new(config.clone())?);
    let registrar = UrlRegistrar::new(config, tokens)?;
    let outcome = registrar.register().await?;
    info!(result = %outcome.to_json(), "C2B URL registration finished");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "🚀 Starting M-Pesa feedback service"
    );

    let missing = config.missing_required_variables();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "Required environment variables are not set; dependent features will fail"
        );
    }

    info!("📊 Initializing database connection pool...");
    let db_pool = init_pool_from_config(&config.database).await?;
    run_migrations(&db_pool).await?;
    info!(
        max_connections = db_pool.options().get_max_connections(),
        "✅ Database ready"
    );

    let mpesa_config = MpesaConfig::from_settings(&config.mpesa);
    if mpesa_config.has_credentials() {
        if let Err(e) = register_c2b_urls(mpesa_config).await {
            error!(error = %e, "C2B URL registration failed; continuing without it");
        }
    } else {
        warn!("⏭️  Skipping C2B URL registration: M-Pesa credentials not configured");
    }

    let notifier = build_notifier(&config.messaging)?;
    let store = Arc::new(PgDataStore::new(db_pool));
    let app = api::router(AppState::new(store, notifier));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "✅ Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}
