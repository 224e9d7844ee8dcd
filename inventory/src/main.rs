mod server;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use inventory_core::{
    bootstrap::{init_database, init_services, load_config, register_self, seed_mock_data},
    logging,
};

use server::InventoryServer;

#[derive(Parser, Debug)]
#[command(name = "inventory")]
#[command(about = "DevOps inventory service", long_about = None)]
struct Args {
    /// Path to a YAML config file (overrides the default search)
    #[arg(long, short = 'c', env = "INVENTORY_CONFIG_PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("Inventory server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Initialize database
    let pool = init_database(&config).await?;

    // 4. Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            anyhow::anyhow!("Migration failed: {e}")
        })?;
    info!("Migrations completed");

    // 5. Initialize services
    let services = init_services(pool.clone(), &config)?;

    // 6. Seed demo data (development only)
    if config.mock.enabled {
        if let Err(e) = seed_mock_data(&services, &config.mock).await {
            warn!("Failed to seed mock data (non-fatal): {}", e);
        }
    }

    // 7. Register this process in its own inventory
    match register_self(&services, &config).await {
        Ok(Some(instance)) => info!(instance_id = %instance.instance_id, "Self-registration complete"),
        Ok(None) => info!("Self-registration disabled"),
        Err(e) => {
            error!("Failed to register this instance: {}", e);
            // Non-fatal: the inventory is still usable without its own row
        }
    }

    // 8. Serve until shutdown
    let server = InventoryServer::new(config, services, pool);
    server.start().await?;

    Ok(())
}
