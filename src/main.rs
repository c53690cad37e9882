#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use hostel_allocation::{
    config::{
        Settings,
        database::{create_connection, create_tables},
    },
    core::credentials::seed_admin,
    errors::Result,
    storage::BlobStore,
    web::{self, AppState},
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings (config.toml plus environment overrides)
    let settings = Settings::load_default()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(database = %settings.database.url, uploads = ?settings.uploads.dir, "Loaded settings");

    // 4. Make sure the data and upload directories exist
    if let Some(dir) = settings.database.sqlite_dir() {
        tokio::fs::create_dir_all(&dir).await?;
    }
    tokio::fs::create_dir_all(&settings.uploads.dir).await?;

    // 5. Connect and create tables
    let db = create_connection(&settings.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 6. Seed the admin account on first start
    if let Some(admin) = seed_admin(&db, &settings.bootstrap).await? {
        info!(username = %admin.username, "Seeded admin account");
    }

    // 7. Serve
    let state = AppState::new(db, BlobStore::new(settings.uploads.dir.clone()));
    let listener = TcpListener::bind(settings.server.socket_addr()?).await?;
    web::serve(listener, state).await
}
