//! # TaskVault API Server
//!
//! Account sessions with rotating refresh tokens and a private,
//! searchable task list per user.
//!
//! ## Usage
//!
//! ```bash
//! ACCESS_TOKEN_SECRET=... REFRESH_TOKEN_SECRET=... cargo run -p taskvault-api
//! ```
//!
//! Without `DATABASE_URL` the server keeps everything in memory.

use taskvault_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use taskvault_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::Storage,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "TaskVault API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = match &config.database {
        Some(db) => {
            let pool = create_pool(DatabaseConfig {
                url: db.url.clone(),
                max_connections: db.max_connections,
                ..Default::default()
            })
            .await?;
            run_migrations(&pool).await?;
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage; data is lost on exit");
            None
        }
    };

    let storage = match &pool {
        Some(pool) => Storage::postgres(pool.clone()),
        None => Storage::memory(),
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(config, storage));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskvault_api=debug,taskvault_shared=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
