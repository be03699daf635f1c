use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wallet_ledger::{
    config::{categories, database},
    errors::Result,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Default-category catalogue, from config.toml when present
    let catalogue = categories::load_default_catalogue()
        .inspect_err(|e| error!("Failed to load category catalogue: {}", e))?;
    info!(
        expense = catalogue.expense.len(),
        income = catalogue.income.len(),
        "Category catalogue loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    db.close().await?;
    Ok(())
}
