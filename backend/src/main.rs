//! Devbook backend server
//!
//! Startup order: environment, logging, configuration, database,
//! immutable application state, then the HTTP listener. Anything that
//! fails before the listener binds aborts the process.

use anyhow::{Context, Result};
use devbook_backend::config::AppConfig;
use devbook_backend::{db, routes, state::AppState};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let production = AppConfig::is_production();
    init_tracing(production);

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if production { "production" } else { "development" },
        token_ttl_secs = config.jwt.token_ttl_secs,
        "Starting Devbook backend"
    );

    if production {
        check_production_config(&config)?;
    }

    let pool = db::create_pool(&config.database).await?;
    // Production schemas are migrated by a separate job
    if !production {
        db::run_migrations(&pool).await?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool, config)?;

    serve(state, &addr).await
}

async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, routes::create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Pretty logs in development, JSON in production; `RUST_LOG` overrides the filter
fn init_tracing(production: bool) {
    let default_filter = if production {
        "devbook_backend=info,tower_http=info"
    } else {
        "devbook_backend=debug,tower_http=debug,sqlx=warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if production {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

fn check_production_config(config: &AppConfig) -> Result<()> {
    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL points at localhost in production");
    }

    let errors = config.production_errors();
    for err in &errors {
        error!("Configuration error: {}", err);
    }
    if !errors.is_empty() {
        anyhow::bail!("Invalid production configuration");
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
