//! # Tako Tasks API Server
//!
//! Issues single-use access keys, installs the Slack app into workspaces and
//! serves the task API used by the Slack bot and by API clients.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tako-api
//! ```

use anyhow::Context;
use tako_api::{
    app::{build_router, AppState},
    config::Config,
};
use tako_shared::{
    db::{self, pool::DatabaseConfig},
    slack::SlackClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tako_api=debug,tako_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Tako Tasks API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = db::pool::create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await
    .context("Failed to connect to database")?;

    db::migrations::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let email = config
        .email
        .build_sender()
        .context("Failed to configure email provider")?;
    tracing::info!(provider = email.provider(), "Email sender ready");

    let slack = SlackClient::new(
        config.slack_config(),
        config.slack.api_base.clone(),
        config.slack_timeout(),
    )
    .context("Failed to build Slack client")?;

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config, email, slack);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db::pool::close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
