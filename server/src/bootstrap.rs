//! Application startup and lifecycle.
//!
//! [`Application::build`] connects to `PostgreSQL` and Redis, applies
//! migrations, creates the bootstrap administrator and binds the listener.
//! [`Application::run`] serves until Ctrl+C or SIGTERM, then gives in-flight
//! requests the configured grace period.

use crate::config::Config;
use crate::server::{AppState, build_router};
use anyhow::Context;
use rifa_auth::stores::RedisSessionStore;
use rifa_core::Stores;
use rifa_core::environment::SystemClock;
use rifa_postgres::PostgresStore;
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// A bound, fully wired server.
pub struct Application {
    listener: TcpListener,
    app: axum::Router,
    shutdown_timeout: Duration,
}

impl Application {
    /// Connect every dependency and bind the listener.
    ///
    /// # Errors
    ///
    /// Database or Redis unreachable, failed migrations, an invalid
    /// bootstrap administrator, or a port already in use.
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.postgres.max_connections)
            .min_connections(config.postgres.min_connections)
            .acquire_timeout(config.postgres.connect_timeout())
            .connect(&config.postgres.url)
            .await
            .context("failed to connect to PostgreSQL")?;
        let store = Arc::new(PostgresStore::from_pool(pool));
        store.migrate().await.context("failed to run migrations")?;
        info!("✓ Database connected and migrated");

        let sessions = Arc::new(
            RedisSessionStore::new(&config.redis.url)
                .await
                .context("failed to connect to Redis")?,
        );
        info!("✓ Session store connected");

        let state = AppState::new(
            &Stores::from_backend(store.clone()),
            sessions.clone(),
            Arc::new(SystemClock),
            config.auth.session_config(),
        )
        .with_check(store)
        .with_check(sessions);

        if let Some((username, password)) = config.auth.bootstrap_admin() {
            match state
                .accounts
                .ensure_admin(username, password)
                .await
                .context("failed to create bootstrap administrator")?
            {
                Some(admin) => info!(user_id = %admin.id, %username, "Bootstrap administrator created"),
                None => info!(%username, "Bootstrap administrator already exists"),
            }
        }

        let app = build_router(
            state,
            &config.server.uploads_dir,
            &config.server.cors_allowed_origins,
        );

        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {address}"))?;

        Ok(Self {
            listener,
            app,
            shutdown_timeout: config.server.shutdown_timeout(),
        })
    }

    /// Serve until a shutdown signal arrives.
    ///
    /// Once the signal fires, in-flight requests get the shutdown timeout to
    /// finish before the server stops waiting for them.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while accepting connections.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self.listener.local_addr().context("listener has no local address")?;
        info!(%address, "HTTP server listening for requests");

        let (signalled_tx, mut signalled_rx) = watch::channel(false);
        let server = axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(true);
            })
            .into_future();

        let timeout = self.shutdown_timeout;
        let deadline = async move {
            // Only start counting once the signal has been received.
            if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(timeout).await;
        };

        tokio::select! {
            result = server => {
                result.context("HTTP server failed")?;
                info!("Graceful shutdown complete");
            }
            () = deadline => {
                warn!(timeout_secs = timeout.as_secs(), "Shutdown timed out, dropping in-flight requests");
            }
        }
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
///
/// A handler that cannot be installed is logged and never resolves, so the
/// other signal still works.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
