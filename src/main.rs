use dotenvy::dotenv;
use std::sync::Arc;
use storefront::{
    api::{self, AppState},
    config::{catalog, database, server::ServerConfig, users},
    errors::Result,
    notify::LogNotifier,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    let server_config = ServerConfig::from_env();

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the catalog from the seed file when one is present
    if server_config.catalog_path.exists() {
        let catalog_config = catalog::load_catalog(&server_config.catalog_path)
            .inspect_err(|e| error!("Failed to load catalog seed: {}", e))?;
        catalog::seed_catalog(&db, catalog_config)
            .await
            .inspect(|count| info!("Seeded {} catalog products.", count))
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    } else {
        warn!(
            "No catalog seed at {}, starting with the existing catalog.",
            server_config.catalog_path.display()
        );
    }

    // 5. Serve the API
    let admin_emails = users::get_admin_emails();
    if admin_emails.is_empty() {
        warn!("{} is empty, no account will be an administrator.", users::ADMIN_EMAILS_VAR);
    }
    let state = AppState::new(db, Arc::new(LogNotifier), admin_emails);

    let listener = TcpListener::bind(&server_config.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", server_config.bind_address, e))?;
    info!("Listening on {}", server_config.bind_address);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}
