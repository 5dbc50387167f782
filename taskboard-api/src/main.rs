//! # Taskboard API Server
//!
//! Loads configuration, prepares the database (migrations and role seed),
//! picks a mail transport and serves the board API until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskboard JWT_SECRET=... cargo run -p taskboard-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use std::sync::Arc;

use anyhow::Context;
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::db::{migrations::run_migrations, pool, seed::{seed_roles, SeedOutcome}};
use taskboard_shared::mail::{HttpMailer, LogMailer, Mailer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(config.database.clone())
        .await
        .context("Failed to connect to the database")?;

    run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    match seed_roles(&db).await.context("Failed to seed roles")? {
        SeedOutcome::Inserted(count) => tracing::info!(count, "Seeded roles"),
        SeedOutcome::Skipped => tracing::debug!("Roles already present, seed skipped"),
    }

    let mailer: Arc<dyn Mailer> = match &config.mail.api_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Sending email through HTTP provider");
            Arc::new(
                HttpMailer::new(
                    url.clone(),
                    config.mail.api_key.clone(),
                    config.mail.from.clone(),
                )
                .context("Failed to create mail client")?,
            )
        }
        None => {
            tracing::warn!("MAIL_API_URL not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let address = config.bind_address();
    let state = AppState::new(db.clone(), config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    pool::close_pool(db).await;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "taskboard_api=debug,taskboard_shared=debug,tower_http=debug".into()
    });

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
