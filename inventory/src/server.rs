//! Server lifecycle management
//!
//! Manages the startup and shutdown of all server components:
//! - HTTP/REST server
//! - Nacos sync scheduler

use sqlx::PgPool;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use inventory_core::{bootstrap::Services, sync::start_sync_scheduler, Config};

/// Inventory server - manages all server components
pub struct InventoryServer {
    config: Config,
    services: Services,
    pool: PgPool,
}

impl InventoryServer {
    /// Create a new server instance
    pub const fn new(config: Config, services: Services, pool: PgPool) -> Self {
        Self {
            config,
            services,
            pool,
        }
    }

    /// Start all components and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        info!("Starting inventory server...");

        // Create shutdown signal channel
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sync_handle = self.start_sync_scheduler(shutdown_rx.clone())?;
        let http_handle = self.start_http_server(shutdown_rx).await?;

        info!("All servers started successfully");

        tokio::select! {
            _ = http_handle => {
                error!("HTTP server stopped unexpectedly");
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        // Signal all components to shut down
        let _ = shutdown_tx.send(true);

        if let Some(handle) = sync_handle {
            if let Err(e) = handle.await {
                warn!("Nacos sync scheduler ended abnormally: {}", e);
            }
        }

        self.shutdown().await;

        Ok(())
    }

    /// Gracefully shut down remaining components
    async fn shutdown(&self) {
        info!("Shutting down inventory server...");

        // Background syncs spawned by the API hold their own client handles
        self.services.synchronizer.shutdown();

        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database pool closed");
    }

    /// Start the periodic Nacos reconciliation, if enabled
    fn start_sync_scheduler(&self, shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<Option<JoinHandle<()>>> {
        let nacos = &self.config.nacos;
        if !nacos.sync_enabled {
            info!("Nacos sync disabled");
            return Ok(None);
        }

        let interval = nacos.sync_interval().map_err(|e| anyhow::anyhow!(e))?;
        let initial_delay = nacos.initial_delay().map_err(|e| anyhow::anyhow!(e))?;

        Ok(Some(start_sync_scheduler(
            self.services.synchronizer.clone(),
            interval,
            initial_delay,
            shutdown_rx,
        )))
    }

    /// Start HTTP server with graceful shutdown support
    async fn start_http_server(&self, shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<JoinHandle<()>> {
        let http_address = self.config.http_address();
        let http_router = inventory_api::create_router(&self.services);

        let listener = tokio::net::TcpListener::bind(&http_address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_address}: {e}"))?;
        info!("HTTP server listening on {}", http_address);

        let handle = tokio::spawn(async move {
            let mut rx = shutdown_rx;
            let graceful = async move {
                let _ = rx.changed().await;
            };

            if let Err(e) = axum::serve(listener, http_router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", e);
            }

            info!("HTTP server shut down gracefully");
        });

        Ok(handle)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
