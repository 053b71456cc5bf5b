use agri_catalog::{
    api,
    config::{
        AppConfig,
        database::{create_connection, create_tables},
        seed::load_seed_if_present,
    },
    core::catalog::{reconcile_category_counts, seed_catalog},
    errors::Result,
};
use dotenvy::dotenv;
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

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Server and database settings
    let config = AppConfig::from_env()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed reference data and repair any drifted category counts
    let seed = load_seed_if_present(&config.seed_path)?;
    seed_catalog(&db, &seed)
        .await
        .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    let corrections = reconcile_category_counts(&db).await?;
    if !corrections.is_empty() {
        warn!("Corrected {} drifted category counts", corrections.len());
    }

    // 6. Serve until shutdown
    api::serve(&config, db).await
}
