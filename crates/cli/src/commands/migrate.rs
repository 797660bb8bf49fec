//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! gl-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GEARLOOM_DATABASE_URL` - SQLite connection string for the storefront

use secrecy::SecretString;
use tracing::info;

use gearloom_storefront::db;

/// Errors that can occur while migrating.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the database
/// cannot be opened, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("GEARLOOM_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("GEARLOOM_DATABASE_URL"))?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running storefront migrations...");
    db::MIGRATOR.run(&pool).await?;

    info!("Storefront migrations complete!");
    Ok(())
}
