use std::sync::Arc;

use bookwise_api::collaborators::{LoggingNotifier, SandboxProcessor, UnconfiguredCalendar};
use bookwise_api::config::ApiConfig;
use bookwise_db::{create_pool, schema::initialize_database};
use color_eyre::eyre::Result;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Collaborator clients; real processor/calendar integrations replace
    // these at deployment time
    let payments = Arc::new(SandboxProcessor);
    let calendar = Arc::new(UnconfiguredCalendar);
    let notifier = Arc::new(LoggingNotifier);

    // Start API server
    bookwise_api::start_server(config, db_pool, payments, calendar, notifier).await?;

    Ok(())
}
