//! Mercato Server
//!
//! Reconciles provider checkout webhooks and browser checkout-success
//! callbacks into exactly one order per payment session.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use mercato_core::framework::DatabaseProcessor;
use mercato_core::notify::{
    ChannelNotifier, ConfirmationMailer, LogNotifier, Notifier, confirmation_channel,
};
use mercato_core::store::{OrderStore, ProductStore};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::{AppState, session_source_for};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Mercato - payment-to-order reconciliation service
#[derive(Parser, Debug)]
#[command(name = "mercato-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./mercato-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting mercato-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    let sessions = session_source_for(&loaded_config.stripe);
    if sessions.is_none() {
        tracing::info!("No stripe.secret_key configured, checkout success will only wait for webhooks");
    }
    let mail_config = loaded_config.mail.clone();
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Convert to shared config with separate locks for each section
    let shared_config = loaded_config.into_shared();

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Confirmation pipeline
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (notifier, mailer_handle) = match mail_config {
        Some(mail_config) => {
            let (confirmation_tx, confirmation_rx) = confirmation_channel();
            let mailer = ConfirmationMailer::new(mail_config, confirmation_rx, shutdown_rx);
            (
                Arc::new(ChannelNotifier::new(confirmation_tx)) as Arc<dyn Notifier>,
                Some(tokio::spawn(mailer.run())),
            )
        }
        None => {
            tracing::info!("No mail relay configured, order confirmations will only be logged");
            (Arc::new(LogNotifier) as Arc<dyn Notifier>, None)
        }
    };

    // Create application state
    let db = DatabaseProcessor::new(db_pool.clone());
    let orders: Arc<dyn OrderStore> = Arc::new(db.clone());
    let products: Arc<dyn ProductStore> = Arc::new(db);
    let state = AppState::new(orders, products, notifier, sessions, shared_config);

    // Spawn config reload handler (listens for SIGHUP)
    let reload_shutdown = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal background tasks to stop
    reload_shutdown.notify_one();
    let _ = shutdown_tx.send(true);
    if let Some(handle) = mailer_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "ConfirmationMailer task failed");
        }
    }

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
